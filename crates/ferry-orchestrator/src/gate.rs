//! Plan approval gate

use ferry_core::Result;

/// Decides whether a plan proceeds to generation
///
/// Declining aborts the whole run. This is the only exit point before
/// generation starts; once a plan is approved, the attempt loop owns the run
/// until it merges or exhausts its budget.
pub trait ApprovalGate: Send + Sync {
    fn approve_plan(&self, plan: &str) -> Result<bool>;
}
