//! Attempt bookkeeping and failure classification
//!
//! Each loop iteration gets an [`AttemptRecord`] for the run summary, and a
//! failed iteration produces exactly one [`FailureReport`]. Only the latest
//! report is carried into the next generation; earlier ones are logged and
//! dropped, so attempts stay independent of each other.

use chrono::{DateTime, Utc};
use ferry_github::PollResult;
use std::fmt;

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Planning,
    AwaitingApproval,
    Generating,
    Validating,
    Writing,
    Testing,
    Publishing,
    Polling,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Planning => "planning",
            Stage::AwaitingApproval => "awaiting approval",
            Stage::Generating => "generating",
            Stage::Validating => "validating",
            Stage::Writing => "writing",
            Stage::Testing => "testing",
            Stage::Publishing => "publishing",
            Stage::Polling => "polling",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What went wrong in one attempt
#[derive(Debug, Clone)]
pub struct FailureReport {
    pub stage: Stage,
    pub detail: String,
}

impl FailureReport {
    pub fn new(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            detail: detail.into(),
        }
    }

    /// Corrective instruction for the next generation prompt
    pub fn to_feedback(&self) -> String {
        match self.stage {
            Stage::Generating => format!(
                "Your previous reply could not be used: {}. Respond with one \
                 block per file using the exact markers and no surrounding prose.",
                self.detail
            ),
            Stage::Validating => format!(
                "These files from your previous reply were cut off before their \
                 end: {}. Emit every file complete, from first line to last.",
                self.detail
            ),
            Stage::Writing => format!(
                "Your previous changes could not be written to the repository: \
                 {}. Use relative paths inside the project only.",
                self.detail
            ),
            Stage::Testing => format!(
                "The test suite failed on your previous changes. Fix the code \
                 so the tests pass.\nTest output:\n{}",
                self.detail
            ),
            Stage::Publishing => format!(
                "Publishing your previous changes failed: {}. Produce a \
                 corrected set of files.",
                self.detail
            ),
            Stage::Polling => format!(
                "CI rejected your previous changes: {}. Produce a corrected \
                 set of files.",
                self.detail
            ),
            Stage::Planning | Stage::AwaitingApproval => self.detail.clone(),
        }
    }
}

/// One loop iteration's bookkeeping, kept for the run summary
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub index: usize,
    pub started_at: DateTime<Utc>,
    /// Paths in the attempt's change-set, in order
    pub files: Vec<String>,
    /// Paths the truncation check rejected
    pub validation_errors: Vec<String>,
    /// Whether the test suite passed, when the attempt got that far
    pub test_result: Option<bool>,
    /// CI verdict, when the attempt reached polling
    pub ci_result: Option<PollResult>,
    pub failure: Option<FailureReport>,
}

impl AttemptRecord {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            started_at: Utc::now(),
            files: Vec::new(),
            validation_errors: Vec::new(),
            test_result: None,
            ci_result: None,
            failure: None,
        }
    }
}
