//! Result-checked repository operations
//!
//! Thin wrappers over [`GitExecutor`] for the commands the deployment loop
//! needs. Each wrapper inspects the process outcome and turns a nonzero exit
//! into a [`FerryError::Git`] carrying the command's stderr, so callers never
//! continue past a failed VCS step.

use ferry_core::{FerryError, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

use crate::{GitExecutor, GitOutput};

/// Repository operations over a [`GitExecutor`]
#[derive(Clone)]
pub struct GitRepo<E: GitExecutor> {
    executor: E,
}

impl<E: GitExecutor> GitRepo<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Working tree root
    pub fn root(&self) -> &PathBuf {
        self.executor.repo_root()
    }

    /// Commit hash of the current HEAD
    pub async fn head_commit(&self) -> Result<String> {
        let output = self.run(&["rev-parse", "HEAD"], "rev-parse").await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Stage the given paths
    pub async fn stage(&self, paths: &[String]) -> Result<()> {
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args, "add").await?;
        Ok(())
    }

    /// Create a commit with the given message
    pub async fn commit(&self, message: &str) -> Result<()> {
        self.run(&["commit", "-m", message], "commit").await?;
        Ok(())
    }

    /// Push the current HEAD to a named remote branch
    ///
    /// Uses a `HEAD:<branch>` refspec so the local branch never has to match
    /// the remote branch name.
    pub async fn push(&self, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("HEAD:{}", branch);
        self.run(&["push", remote, &refspec], "push").await?;
        debug!("Pushed HEAD to {}/{}", remote, branch);
        Ok(())
    }

    /// Restore the given paths to their state at `rev` (index and worktree)
    pub async fn checkout_paths(&self, rev: &str, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["checkout", rev, "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args, "checkout").await?;
        Ok(())
    }

    /// Subset of `paths` that exist as blobs in `rev`
    pub async fn tracked_at(&self, rev: &str, paths: &[String]) -> Result<HashSet<String>> {
        if paths.is_empty() {
            return Ok(HashSet::new());
        }
        let mut args = vec!["ls-tree", "-r", "--name-only", rev, "--"];
        args.extend(paths.iter().map(String::as_str));
        let output = self.run(&args, "ls-tree").await?;
        Ok(output
            .stdout
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    /// Reset the index entries for `paths` to their state at `rev`
    ///
    /// Leaves the worktree alone; entries absent from `rev` are dropped
    /// from the index.
    pub async fn reset_paths(&self, rev: &str, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["reset", "-q", rev, "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args, "reset").await?;
        Ok(())
    }

    /// Hard-reset the working tree and HEAD to `rev`
    pub async fn reset_hard(&self, rev: &str) -> Result<()> {
        self.run(&["reset", "--hard", rev], "reset").await?;
        Ok(())
    }

    async fn run(&self, args: &[&str], what: &str) -> Result<GitOutput> {
        let output = self.executor.exec(args).await?;
        if !output.success {
            let detail = if output.stderr.trim().is_empty() {
                output.stdout.trim().to_string()
            } else {
                output.stderr.trim().to_string()
            };
            return Err(FerryError::Git(format!("git {} failed: {}", what, detail)));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockGitExecutor;

    #[tokio::test]
    async fn head_commit_trims_output() {
        let executor =
            MockGitExecutor::new().with_response("rev-parse HEAD", GitOutput::ok("deadbeef\n"));
        let repo = GitRepo::new(executor);
        assert_eq!(repo.head_commit().await.unwrap(), "deadbeef");
    }

    #[tokio::test]
    async fn stage_and_commit_form_expected_commands() {
        let executor = MockGitExecutor::new();
        let repo = GitRepo::new(executor.clone());

        repo.stage(&["a.ts".to_string(), "b.ts".to_string()])
            .await
            .unwrap();
        repo.commit("feat: add widgets").await.unwrap();

        assert_eq!(
            executor.calls(),
            vec!["add -- a.ts b.ts", "commit -m feat: add widgets"]
        );
    }

    #[tokio::test]
    async fn push_uses_head_refspec() {
        let executor = MockGitExecutor::new();
        let repo = GitRepo::new(executor.clone());

        repo.push("origin", "develop").await.unwrap();
        assert_eq!(executor.calls(), vec!["push origin HEAD:develop"]);
    }

    #[tokio::test]
    async fn failed_command_surfaces_stderr() {
        let executor = MockGitExecutor::new().with_response(
            "push origin HEAD:develop",
            GitOutput::err("remote: rejected (non-fast-forward)"),
        );
        let repo = GitRepo::new(executor);

        let err = repo.push("origin", "develop").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("push"), "unexpected message: {}", message);
        assert!(message.contains("non-fast-forward"));
    }

    #[tokio::test]
    async fn tracked_at_collects_blob_paths() {
        let executor = MockGitExecutor::new().with_response(
            "ls-tree -r --name-only abc -- app/page.tsx app/new.tsx",
            GitOutput::ok("app/page.tsx\n"),
        );
        let repo = GitRepo::new(executor);

        let tracked = repo
            .tracked_at(
                "abc",
                &["app/page.tsx".to_string(), "app/new.tsx".to_string()],
            )
            .await
            .unwrap();
        assert!(tracked.contains("app/page.tsx"));
        assert!(!tracked.contains("app/new.tsx"));
    }

    #[tokio::test]
    async fn reset_paths_targets_the_index_only() {
        let executor = MockGitExecutor::new();
        let repo = GitRepo::new(executor.clone());

        repo.reset_paths("abc", &["app/new.tsx".to_string()])
            .await
            .unwrap();
        assert_eq!(executor.calls(), vec!["reset -q abc -- app/new.tsx"]);
    }

    #[tokio::test]
    async fn empty_path_sets_short_circuit() {
        let executor = MockGitExecutor::new();
        let repo = GitRepo::new(executor.clone());

        repo.checkout_paths("abc", &[]).await.unwrap();
        repo.reset_paths("abc", &[]).await.unwrap();
        assert!(repo.tracked_at("abc", &[]).await.unwrap().is_empty());
        assert!(executor.calls().is_empty());
    }
}
