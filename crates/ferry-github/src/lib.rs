//! # ferry-github
//!
//! Code-hosting integration for ferry.
//!
//! This crate provides:
//! - The [`CodeHost`] seam with a real GitHub REST client and a scripted mock
//! - Check-run polling with fail-fast classification and a wall-clock budget
//! - Pull-request publication gated on the poll verdict

mod client;
mod poll;
mod publish;
mod types;

pub use client::{host_token, CodeHost, GitHubClient, MockHost};
pub use poll::{CiPoller, PollConfig, PollResult};
pub use publish::Publisher;
pub use types::{CheckConclusion, CheckRun, CheckStatus, PullRequest, PullRequestSpec};
