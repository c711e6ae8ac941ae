//! Pull-request publishing
//!
//! Composite of the three hosting steps: open the pull request, wait for
//! its head commit's checks, merge. The merge only happens on a passing
//! verdict; failed and timed-out checks surface as distinct errors so the
//! caller can log and retry them differently.

use ferry_core::{FerryError, Result};
use tracing::{info, warn};

use crate::client::CodeHost;
use crate::poll::{CiPoller, PollConfig, PollResult};
use crate::types::{PullRequest, PullRequestSpec};

pub struct Publisher<'a, H: CodeHost> {
    host: &'a H,
    poll: PollConfig,
}

impl<'a, H: CodeHost> Publisher<'a, H> {
    pub fn new(host: &'a H, poll: PollConfig) -> Self {
        Self { host, poll }
    }

    /// Open, verify, and merge one pull request
    ///
    /// The returned [`PullRequest`] identifies the merged change. Any error
    /// leaves the pull request open (or, for creation errors, nonexistent);
    /// abandoned pull requests are never reused.
    pub async fn publish(&self, spec: &PullRequestSpec) -> Result<PullRequest> {
        let pr = self.host.create_pull_request(spec).await?;
        info!("Opened pull request #{}: {}", pr.number, pr.html_url);

        let poller = CiPoller::new(self.host, self.poll.clone());
        match poller.poll(&pr.head_sha).await? {
            PollResult::Passed => {}
            PollResult::Failed => {
                return Err(FerryError::ChecksFailed(format!(
                    "pull request #{} ({})",
                    pr.number, pr.html_url
                )));
            }
            PollResult::TimedOut => {
                warn!("Gave up waiting on checks for pull request #{}", pr.number);
                return Err(FerryError::ChecksTimedOut(format!(
                    "pull request #{} ({})",
                    pr.number, pr.html_url
                )));
            }
        }

        self.host.merge_pull_request(pr.number).await?;
        info!("Merged pull request #{}", pr.number);

        Ok(pr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockHost;
    use crate::types::{CheckConclusion, CheckRun, CheckStatus};
    use std::time::Duration;

    fn spec() -> PullRequestSpec {
        PullRequestSpec {
            title: "feat: add impressum page".to_string(),
            body: "Automated change".to_string(),
            head: "develop".to_string(),
            base: "main".to_string(),
        }
    }

    fn quick_poll() -> PollConfig {
        PollConfig {
            timeout: Duration::from_secs(50),
            pending_delay: Duration::from_secs(20),
            retry_delay: Duration::from_secs(10),
        }
    }

    #[tokio::test]
    async fn merges_once_checks_pass() {
        let host = MockHost::new()
            .with_check_runs(vec![CheckRun::completed("ci", CheckConclusion::Success)]);
        let publisher = Publisher::new(&host, quick_poll());

        let pr = publisher.publish(&spec()).await.unwrap();

        assert_eq!(pr.number, 1);
        assert_eq!(host.count_of("create"), 1);
        assert_eq!(host.count_of("merge"), 1);
    }

    #[tokio::test]
    async fn creation_rejection_skips_polling() {
        let host = MockHost::new().rejecting_creation("Validation Failed");
        let publisher = Publisher::new(&host, quick_poll());

        let err = publisher.publish(&spec()).await.unwrap_err();

        assert!(matches!(err, FerryError::PullRequest(_)));
        assert_eq!(host.count_of("checks"), 0);
        assert_eq!(host.count_of("merge"), 0);
    }

    #[tokio::test]
    async fn failed_checks_block_the_merge() {
        let host = MockHost::new()
            .with_check_runs(vec![CheckRun::completed("ci", CheckConclusion::Failure)]);
        let publisher = Publisher::new(&host, quick_poll());

        let err = publisher.publish(&spec()).await.unwrap_err();

        assert!(matches!(err, FerryError::ChecksFailed(_)));
        assert_eq!(host.count_of("merge"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_checks_time_out_without_merging() {
        let host = MockHost::new()
            .with_check_runs(vec![CheckRun::pending("ci", CheckStatus::InProgress)]);
        let publisher = Publisher::new(&host, quick_poll());

        let err = publisher.publish(&spec()).await.unwrap_err();

        assert!(matches!(err, FerryError::ChecksTimedOut(_)));
        assert_eq!(host.count_of("merge"), 0);
    }

    #[tokio::test]
    async fn merge_rejection_propagates() {
        let host = MockHost::new()
            .with_check_runs(vec![CheckRun::completed("ci", CheckConclusion::Success)])
            .rejecting_merge("Pull Request is not mergeable");
        let publisher = Publisher::new(&host, quick_poll());

        let err = publisher.publish(&spec()).await.unwrap_err();

        assert!(matches!(err, FerryError::Merge(_)));
    }
}
