//! CI status polling
//!
//! Repeatedly fetches the full check-run set for a commit and classifies the
//! snapshot from scratch each cycle; nothing is carried between fetches, so
//! a stale earlier snapshot can never mask a newer one. Delays are fixed per
//! wait reason (shorter after a transport error or before checks have been
//! scheduled, longer while runs are pending), and every sleep is capped at
//! the wall-clock deadline.

use ferry_core::Result;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::CodeHost;
use crate::types::{CheckConclusion, CheckRun, CheckStatus};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);
pub const DEFAULT_PENDING_DELAY: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Fixed delays and the wall-clock budget for one poll
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Hard deadline for the whole poll
    pub timeout: Duration,
    /// Delay between cycles while runs are pending
    pub pending_delay: Duration,
    /// Delay after a fetch error or while no runs are scheduled yet
    pub retry_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            pending_delay: DEFAULT_PENDING_DELAY,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl PollConfig {
    /// Build from the `[poll]` configuration table
    pub fn from_settings(settings: &ferry_core::PollSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_secs),
            pending_delay: Duration::from_secs(settings.pending_delay_secs),
            retry_delay: Duration::from_secs(settings.retry_delay_secs),
        }
    }
}

/// Terminal result of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollResult {
    /// Every run completed with a benign conclusion
    Passed,
    /// At least one run failed, or a completed run had a non-benign conclusion
    Failed,
    /// The wall-clock budget elapsed first
    TimedOut,
}

impl std::fmt::Display for PollResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PollResult::Passed => "passed",
            PollResult::Failed => "failed",
            PollResult::TimedOut => "timed out",
        };
        write!(f, "{}", label)
    }
}

/// Aggregate state of one fetched snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Passed,
    Failed,
    Pending,
    NotStarted,
}

const FAILING: &[CheckConclusion] = &[
    CheckConclusion::Failure,
    CheckConclusion::Cancelled,
    CheckConclusion::TimedOut,
];

fn is_failing(run: &CheckRun) -> bool {
    run.conclusion.map(|c| FAILING.contains(&c)).unwrap_or(false)
}

/// Classify a snapshot
///
/// A single failing conclusion fails the whole snapshot immediately, even
/// with other runs still pending. All-completed snapshots pass only when
/// every conclusion is success or skipped; anything else (including a
/// missing or unrecognized conclusion on a completed run) fails.
fn classify(runs: &[CheckRun]) -> Verdict {
    if runs.is_empty() {
        return Verdict::NotStarted;
    }

    if runs.iter().any(is_failing) {
        return Verdict::Failed;
    }

    if runs.iter().any(|run| run.status != CheckStatus::Completed) {
        return Verdict::Pending;
    }

    let all_benign = runs.iter().all(|run| {
        matches!(
            run.conclusion,
            Some(CheckConclusion::Success) | Some(CheckConclusion::Skipped)
        )
    });

    if all_benign {
        Verdict::Passed
    } else {
        Verdict::Failed
    }
}

/// Polls a commit's check runs until they resolve, fail, or time out
pub struct CiPoller<'a, H: CodeHost> {
    host: &'a H,
    config: PollConfig,
}

impl<'a, H: CodeHost> CiPoller<'a, H> {
    pub fn new(host: &'a H, config: PollConfig) -> Self {
        Self { host, config }
    }

    /// Poll until a terminal verdict or the deadline
    ///
    /// Transport errors are transient: the fetch is retried after the short
    /// delay and only the wall clock keeps counting.
    pub async fn poll(&self, sha: &str) -> Result<PollResult> {
        let deadline = Instant::now() + self.config.timeout;
        info!("Waiting on check runs for {}", sha);

        loop {
            let delay = match self.host.list_check_runs(sha).await {
                Err(e) => {
                    warn!("Check-run fetch failed ({}); retrying", e);
                    self.config.retry_delay
                }
                Ok(runs) => match classify(&runs) {
                    Verdict::Failed => {
                        let failed: Vec<&str> = runs
                            .iter()
                            .filter(|run| is_failing(run))
                            .map(|run| run.name.as_str())
                            .collect();
                        if failed.is_empty() {
                            info!("Checks concluded without success");
                        } else {
                            info!("Checks failed: {}", failed.join(", "));
                        }
                        return Ok(PollResult::Failed);
                    }
                    Verdict::Passed => {
                        info!("All {} checks passed", runs.len());
                        return Ok(PollResult::Passed);
                    }
                    Verdict::NotStarted => {
                        debug!("No check runs scheduled yet");
                        self.config.retry_delay
                    }
                    Verdict::Pending => {
                        let done = runs
                            .iter()
                            .filter(|run| run.status == CheckStatus::Completed)
                            .count();
                        debug!("Checks pending ({}/{} completed)", done, runs.len());
                        self.config.pending_delay
                    }
                },
            };

            let now = Instant::now();
            if now >= deadline {
                warn!("Poll timed out after {:?}", self.config.timeout);
                return Ok(PollResult::TimedOut);
            }

            tokio::time::sleep_until(deadline.min(now + delay)).await;

            if Instant::now() >= deadline {
                warn!("Poll timed out after {:?}", self.config.timeout);
                return Ok(PollResult::TimedOut);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockHost;

    fn fast_config(timeout_secs: u64) -> PollConfig {
        PollConfig {
            timeout: Duration::from_secs(timeout_secs),
            pending_delay: Duration::from_secs(40),
            retry_delay: Duration::from_secs(10),
        }
    }

    #[test]
    fn classify_empty_set_is_not_started() {
        assert_eq!(classify(&[]), Verdict::NotStarted);
    }

    #[test]
    fn classify_any_failure_wins_over_pending() {
        let runs = vec![
            CheckRun::completed("unit", CheckConclusion::Failure),
            CheckRun::pending("e2e", CheckStatus::InProgress),
        ];
        assert_eq!(classify(&runs), Verdict::Failed);

        let runs = vec![
            CheckRun::completed("unit", CheckConclusion::Cancelled),
            CheckRun::pending("e2e", CheckStatus::Queued),
        ];
        assert_eq!(classify(&runs), Verdict::Failed);
    }

    #[test]
    fn classify_success_and_skipped_pass() {
        let runs = vec![
            CheckRun::completed("unit", CheckConclusion::Success),
            CheckRun::completed("optional", CheckConclusion::Skipped),
        ];
        assert_eq!(classify(&runs), Verdict::Passed);
    }

    #[test]
    fn classify_unknown_conclusions_are_not_benign() {
        let runs = vec![
            CheckRun::completed("unit", CheckConclusion::Success),
            CheckRun::completed("odd", CheckConclusion::Neutral),
        ];
        assert_eq!(classify(&runs), Verdict::Failed);

        let runs = vec![CheckRun {
            name: "ghost".to_string(),
            status: CheckStatus::Completed,
            conclusion: None,
        }];
        assert_eq!(classify(&runs), Verdict::Failed);
    }

    #[test]
    fn classify_waits_for_pending_runs() {
        let runs = vec![
            CheckRun::completed("unit", CheckConclusion::Success),
            CheckRun::pending("e2e", CheckStatus::InProgress),
        ];
        assert_eq!(classify(&runs), Verdict::Pending);
    }

    #[tokio::test]
    async fn fail_fast_returns_without_waiting() {
        let host = MockHost::new().with_check_runs(vec![
            CheckRun::completed("unit", CheckConclusion::Failure),
            CheckRun::pending("e2e", CheckStatus::InProgress),
        ]);
        let poller = CiPoller::new(&host, fast_config(600));

        let started = Instant::now();
        let result = poller.poll("sha1").await.unwrap();

        assert_eq!(result, PollResult::Failed);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(host.count_of("checks"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn passes_after_pending_cycles() {
        let host = MockHost::new()
            .with_check_runs(vec![CheckRun::pending("ci", CheckStatus::Queued)])
            .with_check_runs(vec![CheckRun::pending("ci", CheckStatus::InProgress)])
            .with_check_runs(vec![CheckRun::completed("ci", CheckConclusion::Success)]);
        let poller = CiPoller::new(&host, fast_config(600));

        let result = poller.poll("sha2").await.unwrap();

        assert_eq!(result, PollResult::Passed);
        assert_eq!(host.count_of("checks"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_exactly_at_the_deadline() {
        let host =
            MockHost::new().with_check_runs(vec![CheckRun::pending("ci", CheckStatus::InProgress)]);
        // pending_delay 40s: fetches at t=0, 40, 80, then the capped sleep
        // wakes at the 100s deadline.
        let poller = CiPoller::new(&host, fast_config(100));

        let started = Instant::now();
        let result = poller.poll("sha3").await.unwrap();

        assert_eq!(result, PollResult::TimedOut);
        assert_eq!(started.elapsed(), Duration::from_secs(100));
        assert_eq!(host.count_of("checks"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_do_not_fail_the_poll() {
        let host = MockHost::new()
            .with_fetch_error("502 Bad Gateway")
            .with_fetch_error("502 Bad Gateway")
            .with_check_runs(vec![CheckRun::completed("ci", CheckConclusion::Success)]);
        let poller = CiPoller::new(&host, fast_config(600));

        let result = poller.poll("sha4").await.unwrap();

        assert_eq!(result, PollResult::Passed);
        assert_eq!(host.count_of("checks"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_scheduled_runs_wait_then_resolve() {
        let host = MockHost::new()
            .with_check_runs(Vec::new())
            .with_check_runs(vec![CheckRun::completed("ci", CheckConclusion::Success)]);
        let poller = CiPoller::new(&host, fast_config(600));

        let result = poller.poll("sha5").await.unwrap();
        assert_eq!(result, PollResult::Passed);
    }

    #[tokio::test(start_paused = true)]
    async fn never_scheduled_runs_time_out() {
        let host = MockHost::new().with_check_runs(Vec::new());
        // retry_delay 10s: fetches at t=0, 10, 20, deadline at 25.
        let poller = CiPoller::new(&host, fast_config(25));

        let started = Instant::now();
        let result = poller.poll("sha6").await.unwrap();

        assert_eq!(result, PollResult::TimedOut);
        assert_eq!(started.elapsed(), Duration::from_secs(25));
    }
}
