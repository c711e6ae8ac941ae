//! Deployment orchestration
//!
//! One run carries a feature request from plan approval through up to
//! [`MAX_ATTEMPTS`] generate-validate-write-test-publish attempts. Attempts
//! are strictly sequential: each starts from a base commit captured before
//! any write, and every failure rolls the tree back to that base before the
//! next attempt begins. The generator is handed only the latest failure's
//! report, never an accumulated history.
//!
//! Failures inside an attempt never escape the loop; they become
//! [`FailureReport`]s and consume budget. Failures of the rollback itself,
//! and errors before the loop starts, end the run.

use ferry_agent::apply_change_set;
use ferry_core::{FerryError, Result};
use ferry_git::{GitExecutor, GitRepo};
use ferry_github::{CodeHost, PollResult, Publisher, PullRequest, PullRequestSpec};
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::{Generator, Planner};
use crate::attempt::{AttemptRecord, FailureReport, Stage};
use crate::context::ProjectContext;
use crate::gate::ApprovalGate;
use crate::recovery::RecoveryManager;
use crate::testrun::TestRunner;

/// Fixed attempt budget for one run
pub const MAX_ATTEMPTS: usize = 3;

/// Longest request prefix used in commit messages and PR titles
const TITLE_CAP: usize = 60;

/// Per-run settings beyond the collaborators themselves
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub max_attempts: usize,
    pub remote: String,
    pub head_branch: String,
    pub base_branch: String,
    pub protected_files: Vec<String>,
}

impl DeployConfig {
    pub fn from_config(config: &ferry_core::FerryConfig) -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            remote: config.git.remote.clone(),
            head_branch: config.git.head_branch.clone(),
            base_branch: config.git.base_branch.clone(),
            protected_files: config.workspace.protected_files.clone(),
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self::from_config(&ferry_core::FerryConfig::default())
    }
}

/// Terminal result of one run
#[derive(Debug)]
pub enum RunOutcome {
    /// An attempt's pull request merged
    Merged { pr: PullRequest, attempts: usize },
    /// The plan was declined at the approval gate
    Aborted,
    /// Every attempt in the budget failed
    Exhausted { attempts: usize },
}

enum AttemptOutcome {
    Merged(PullRequest),
    Failed(FailureReport),
}

/// Drives one feature request to a merged pull request, or runs out of budget
pub struct Deployment<'a, E: GitExecutor, H: CodeHost> {
    planner: &'a dyn Planner,
    generator: &'a dyn Generator,
    tests: &'a dyn TestRunner,
    gate: &'a dyn ApprovalGate,
    repo: &'a GitRepo<E>,
    publisher: Publisher<'a, H>,
    config: DeployConfig,
    run_id: Uuid,
    attempts: Vec<AttemptRecord>,
}

impl<'a, E: GitExecutor, H: CodeHost> Deployment<'a, E, H> {
    pub fn new(
        planner: &'a dyn Planner,
        generator: &'a dyn Generator,
        tests: &'a dyn TestRunner,
        gate: &'a dyn ApprovalGate,
        repo: &'a GitRepo<E>,
        publisher: Publisher<'a, H>,
        config: DeployConfig,
    ) -> Self {
        Self {
            planner,
            generator,
            tests,
            gate,
            repo,
            publisher,
            config,
            run_id: Uuid::new_v4(),
            attempts: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Records of every attempt so far, failed and successful
    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    /// Run the full pipeline for one feature request
    pub async fn run(&mut self, request: &str, context: &ProjectContext) -> Result<RunOutcome> {
        info!("Run {} started", self.run_id);

        info!("Stage: {}", Stage::Planning);
        let plan = self.planner.plan(request, context).await?;

        info!("Stage: {}", Stage::AwaitingApproval);
        if !self.gate.approve_plan(&plan)? {
            info!("Plan declined, run aborted");
            return Ok(RunOutcome::Aborted);
        }

        let mut feedback: Option<FailureReport> = None;

        for index in 1..=self.config.max_attempts {
            info!("=== Attempt {} of {} ===", index, self.config.max_attempts);

            let outcome = self
                .run_attempt(index, request, context, feedback.as_ref())
                .await?;
            match outcome {
                AttemptOutcome::Merged(pr) => {
                    info!(
                        "Run {} merged {} after {} attempt(s)",
                        self.run_id, pr.html_url, index
                    );
                    return Ok(RunOutcome::Merged { pr, attempts: index });
                }
                AttemptOutcome::Failed(report) => {
                    warn!(
                        "Attempt {} failed while {}: {}",
                        index, report.stage, report.detail
                    );
                    feedback = Some(report);
                }
            }
        }

        warn!(
            "Run {} exhausted its {} attempts",
            self.run_id, self.config.max_attempts
        );
        Ok(RunOutcome::Exhausted {
            attempts: self.config.max_attempts,
        })
    }

    async fn run_attempt(
        &mut self,
        index: usize,
        request: &str,
        context: &ProjectContext,
        feedback: Option<&FailureReport>,
    ) -> Result<AttemptOutcome> {
        let mut record = AttemptRecord::new(index);
        let recovery = RecoveryManager::new(self.repo);

        info!("Stage: {}", Stage::Generating);
        let generated = self.generator.generate(request, context, feedback).await;
        let change_set = match generated {
            Ok(set) => set,
            Err(e) => {
                let report = FailureReport::new(
                    Stage::Generating,
                    format!("the generation call failed: {}", e),
                );
                return self.fail(record, report);
            }
        };
        if change_set.is_empty() {
            let report = FailureReport::new(
                Stage::Generating,
                "it contained no complete file blocks".to_string(),
            );
            return self.fail(record, report);
        }
        record.files = change_set.paths();

        info!("Stage: {}", Stage::Validating);
        let truncated = ferry_agent::truncated_paths(&change_set);
        if !truncated.is_empty() {
            record.validation_errors = truncated.clone();
            let report = FailureReport::new(Stage::Validating, truncated.join(", "));
            return self.fail(record, report);
        }

        // Base snapshot before the tree is touched
        let point = recovery.capture().await?;

        info!("Stage: {}", Stage::Writing);
        if let Err(e) = apply_change_set(self.repo.root(), &change_set, &self.config.protected_files)
        {
            recovery.restore_paths(&point, &record.files).await?;
            return self.fail(record, FailureReport::new(Stage::Writing, e.to_string()));
        }

        info!("Stage: {}", Stage::Testing);
        let tested = self.tests.run(self.repo.root()).await;
        match tested {
            Ok(report) if report.success => {
                record.test_result = Some(true);
            }
            Ok(report) => {
                record.test_result = Some(false);
                recovery.restore_paths(&point, &record.files).await?;
                return self.fail(record, FailureReport::new(Stage::Testing, report.output));
            }
            Err(e) => {
                recovery.restore_paths(&point, &record.files).await?;
                let report = FailureReport::new(
                    Stage::Testing,
                    format!("the test suite could not be launched: {}", e),
                );
                return self.fail(record, report);
            }
        }

        info!("Stage: {}", Stage::Publishing);
        let title = commit_message(request);
        let head_branch = head_branch_for(&self.config.head_branch, index);

        if let Err(e) = self.repo.stage(&record.files).await {
            recovery.restore_paths(&point, &record.files).await?;
            return self.fail(record, FailureReport::new(Stage::Publishing, e.to_string()));
        }
        if let Err(e) = self.repo.commit(&title).await {
            recovery.restore_paths(&point, &record.files).await?;
            return self.fail(record, FailureReport::new(Stage::Publishing, e.to_string()));
        }
        // The commit exists from here on; failures reset the branch to the
        // base and abandon whatever reached the remote.
        if let Err(e) = self.repo.push(&self.config.remote, &head_branch).await {
            recovery.reset_to(&point).await?;
            return self.fail(record, FailureReport::new(Stage::Publishing, e.to_string()));
        }

        let spec = PullRequestSpec {
            title,
            body: format!(
                "Automated change via ferry (run {}, attempt {})",
                short_run_id(&self.run_id),
                index
            ),
            head: head_branch,
            base: self.config.base_branch.clone(),
        };

        let published = self.publisher.publish(&spec).await;
        match published {
            Ok(pr) => {
                record.ci_result = Some(PollResult::Passed);
                self.attempts.push(record);
                Ok(AttemptOutcome::Merged(pr))
            }
            Err(e) => {
                recovery.reset_to(&point).await?;
                let report = match &e {
                    FerryError::ChecksFailed(detail) => {
                        record.ci_result = Some(PollResult::Failed);
                        FailureReport::new(Stage::Polling, format!("checks failed on {}", detail))
                    }
                    FerryError::ChecksTimedOut(detail) => {
                        record.ci_result = Some(PollResult::TimedOut);
                        FailureReport::new(
                            Stage::Polling,
                            format!("checks timed out on {}", detail),
                        )
                    }
                    other => FailureReport::new(Stage::Publishing, other.to_string()),
                };
                self.fail(record, report)
            }
        }
    }

    fn fail(
        &mut self,
        mut record: AttemptRecord,
        report: FailureReport,
    ) -> Result<AttemptOutcome> {
        record.failure = Some(report.clone());
        self.attempts.push(record);
        Ok(AttemptOutcome::Failed(report))
    }
}

/// `feat:` plus the request, cut at a char boundary
fn commit_message(request: &str) -> String {
    format!("feat: {}", truncate_chars(request.trim(), TITLE_CAP))
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

/// Attempt 1 uses the configured branch; retries get a fresh suffix so an
/// abandoned remote branch or open PR is never reused
fn head_branch_for(head: &str, attempt: usize) -> String {
    if attempt <= 1 {
        head.to_string()
    } else {
        format!("{}-attempt-{}", head, attempt)
    }
}

fn short_run_id(run_id: &Uuid) -> String {
    run_id.to_string().chars().take(8).collect()
}
