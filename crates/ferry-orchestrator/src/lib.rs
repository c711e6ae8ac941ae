//! # ferry-orchestrator
//!
//! Deployment orchestration engine for ferry.
//!
//! This crate provides:
//! - The bounded-retry deployment loop (plan, approve, generate, validate,
//!   write, test, publish)
//! - Working-tree recovery between attempts
//! - Planning and generation collaborators over the Anthropic API
//! - Test runner and approval gate seams
//! - Project context assembly and prompt building

mod agents;
mod attempt;
mod context;
mod deploy;
mod gate;
mod prompt;
mod recovery;
mod testrun;

pub use agents::{FeatureCoder, FeaturePlanner, Generator, Planner};
pub use attempt::{AttemptRecord, FailureReport, Stage};
pub use context::ProjectContext;
pub use deploy::{DeployConfig, Deployment, RunOutcome, MAX_ATTEMPTS};
pub use gate::ApprovalGate;
pub use recovery::{RecoveryManager, RecoveryPoint};
pub use testrun::{MockTestRunner, ProcessTestRunner, TestReport, TestRunner};
