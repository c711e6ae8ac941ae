//! # ferry-git
//!
//! Git integration layer for ferry.
//!
//! This crate provides:
//! - Git command execution abstraction (real and mock executors)
//! - Result-checked repository operations used by the deployment loop
//!
//! Every operation reports success or failure explicitly; ferry never treats
//! a git invocation as fire-and-forget.

mod command;
mod repo;

pub use command::{GitCommand, GitExecutor, GitOutput, MockGitExecutor};
pub use repo::GitRepo;
