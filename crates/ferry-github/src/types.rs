//! Types for the code-hosting REST interface

use serde::{Deserialize, Serialize};

/// A created pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
    /// Commit the head branch pointed at when the PR was created; check
    /// runs are polled against this
    pub head_sha: String,
}

/// Request body for creating a pull request
#[derive(Debug, Clone, Serialize)]
pub struct PullRequestSpec {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

/// Lifecycle state of a check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Queued,
    InProgress,
    Completed,
}

/// Terminal conclusion of a completed check run
///
/// The hosting service can introduce new conclusion values; anything
/// unrecognized lands on `Unknown` and is treated as failing by the poller
/// rather than assumed benign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    Failure,
    Cancelled,
    TimedOut,
    Skipped,
    Neutral,
    ActionRequired,
    Stale,
    #[serde(other)]
    Unknown,
}

/// A single CI job snapshot for a commit
///
/// Fetched fresh on every poll cycle; never persisted across cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRun {
    pub name: String,
    pub status: CheckStatus,
    #[serde(default)]
    pub conclusion: Option<CheckConclusion>,
}

impl CheckRun {
    /// A completed run with the given conclusion
    pub fn completed(name: &str, conclusion: CheckConclusion) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Completed,
            conclusion: Some(conclusion),
        }
    }

    /// A run that has not finished yet
    pub fn pending(name: &str, status: CheckStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
            conclusion: None,
        }
    }
}
