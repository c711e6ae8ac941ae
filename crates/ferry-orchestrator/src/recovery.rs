//! Working-tree recovery between attempts
//!
//! A recovery point is the commit the tree sat on before an attempt wrote
//! anything. Failures before the attempt's commit restore the touched paths
//! from that commit; failures after the push reset the whole tree to it and
//! abandon the remote branch.

use chrono::{DateTime, Utc};
use ferry_core::Result;
use ferry_git::{GitExecutor, GitRepo};
use tracing::{info, warn};

/// A known-good base captured before an attempt mutates the tree
#[derive(Debug, Clone)]
pub struct RecoveryPoint {
    pub base_commit: String,
    pub created_at: DateTime<Utc>,
}

impl RecoveryPoint {
    pub fn new(base_commit: String) -> Self {
        Self {
            base_commit,
            created_at: Utc::now(),
        }
    }
}

/// Restore operations against a recovery point
pub struct RecoveryManager<'a, E: GitExecutor> {
    repo: &'a GitRepo<E>,
}

impl<'a, E: GitExecutor> RecoveryManager<'a, E> {
    pub fn new(repo: &'a GitRepo<E>) -> Self {
        Self { repo }
    }

    /// Capture the current commit as the attempt's base
    pub async fn capture(&self) -> Result<RecoveryPoint> {
        let base_commit = self.repo.head_commit().await?;
        info!("Recovery point at {}", base_commit);
        Ok(RecoveryPoint::new(base_commit))
    }

    /// Put every given path back the way the base commit had it
    ///
    /// Index entries are reset first so a half-staged attempt cannot leak
    /// into the next commit. Paths tracked at the base are then checked out
    /// from it; paths the base did not know are deleted from the tree.
    pub async fn restore_paths(&self, point: &RecoveryPoint, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        self.repo.reset_paths(&point.base_commit, paths).await?;

        let tracked = self.repo.tracked_at(&point.base_commit, paths).await?;
        let (known, created): (Vec<String>, Vec<String>) = paths
            .iter()
            .cloned()
            .partition(|path| tracked.contains(path));

        self.repo
            .checkout_paths(&point.base_commit, &known)
            .await?;

        for path in &created {
            let absolute = self.repo.root().join(path);
            match tokio::fs::remove_file(&absolute).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove {}: {}", absolute.display(), e),
            }
        }

        info!(
            "Restored {} path(s) to {}",
            paths.len(),
            point.base_commit
        );
        Ok(())
    }

    /// Drop everything since the base, committed or not
    pub async fn reset_to(&self, point: &RecoveryPoint) -> Result<()> {
        self.repo.reset_hard(&point.base_commit).await?;
        info!("Reset working tree to {}", point.base_commit);
        Ok(())
    }
}
