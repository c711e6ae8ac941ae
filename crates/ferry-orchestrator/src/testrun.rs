//! External test suite execution
//!
//! The contract with the suite is its exit status. Output is captured only
//! to enrich failure feedback, trimmed and capped so a noisy suite cannot
//! flood the next generation prompt.

use async_trait::async_trait;
use ferry_core::{FerryError, Result};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, instrument};

/// Cap on captured output carried into failure feedback
const OUTPUT_CAP: usize = 4000;

/// Outcome of one test-suite run
#[derive(Debug, Clone)]
pub struct TestReport {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr, trimmed, tail-capped
    pub output: String,
}

impl TestReport {
    pub fn passed() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            output: String::new(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(1),
            output: output.into(),
        }
    }
}

/// Runs the project's test suite in a working tree
#[async_trait]
pub trait TestRunner: Send + Sync {
    /// Err means the suite could not be launched at all
    async fn run(&self, dir: &Path) -> Result<TestReport>;
}

/// Runs the configured test command as a child process
pub struct ProcessTestRunner {
    argv: Vec<String>,
}

impl ProcessTestRunner {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

#[async_trait]
impl TestRunner for ProcessTestRunner {
    #[instrument(skip(self, dir), fields(command = %self.argv.join(" ")))]
    async fn run(&self, dir: &Path) -> Result<TestReport> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| FerryError::TestRunner("test command is empty".to_string()))?;

        info!("Running tests in {}", dir.display());
        let output = tokio::process::Command::new(program)
            .args(args)
            .current_dir(dir)
            .output()
            .await
            .map_err(|e| FerryError::TestRunner(format!("failed to launch {}: {}", program, e)))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        let report = TestReport {
            success: output.status.success(),
            exit_code: output.status.code(),
            output: cap_output(&combined),
        };
        info!(
            "Test suite {} (exit {:?})",
            if report.success { "passed" } else { "failed" },
            report.exit_code
        );
        Ok(report)
    }
}

/// Keep the tail of the output; suites print their failure summary last
fn cap_output(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() <= OUTPUT_CAP {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - OUTPUT_CAP;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    format!("... {}", &trimmed[start..])
}

/// Scripted [`TestRunner`] for tests
///
/// Pops one queued report per run and falls back to a pass once the queue
/// is empty. Records every directory it was invoked in.
pub struct MockTestRunner {
    queue: Mutex<VecDeque<TestReport>>,
    runs: Mutex<Vec<PathBuf>>,
}

impl Default for MockTestRunner {
    fn default() -> Self {
        Self::passing()
    }
}

impl MockTestRunner {
    pub fn passing() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            runs: Mutex::new(Vec::new()),
        }
    }

    /// Queue a failing run before the fallback passes kick in
    pub fn with_failure(self, output: &str) -> Self {
        self.queue
            .lock()
            .unwrap()
            .push_back(TestReport::failed(output));
        self
    }

    pub fn runs(&self) -> usize {
        self.runs.lock().unwrap().len()
    }
}

#[async_trait]
impl TestRunner for MockTestRunner {
    async fn run(&self, dir: &Path) -> Result<TestReport> {
        self.runs.lock().unwrap().push(dir.to_path_buf());
        let next = self.queue.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(TestReport::passed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_exit_passes() {
        let runner = ProcessTestRunner::new(vec!["true".to_string()]);
        let report = runner.run(Path::new(".")).await.unwrap();

        assert!(report.success);
        assert_eq!(report.exit_code, Some(0));
    }

    #[tokio::test]
    async fn nonzero_exit_fails_with_output() {
        let runner = ProcessTestRunner::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo 1 failing; exit 1".to_string(),
        ]);
        let report = runner.run(Path::new(".")).await.unwrap();

        assert!(!report.success);
        assert_eq!(report.exit_code, Some(1));
        assert!(report.output.contains("1 failing"));
    }

    #[tokio::test]
    async fn unlaunchable_command_is_an_error() {
        let runner = ProcessTestRunner::new(vec!["ferry-no-such-binary".to_string()]);
        let err = runner.run(Path::new(".")).await.unwrap_err();

        assert!(matches!(err, FerryError::TestRunner(_)));
    }

    #[tokio::test]
    async fn empty_command_is_an_error() {
        let runner = ProcessTestRunner::new(Vec::new());
        assert!(runner.run(Path::new(".")).await.is_err());
    }

    #[test]
    fn cap_keeps_the_tail() {
        let long = format!("{}FAIL at the end", "x".repeat(OUTPUT_CAP * 2));
        let capped = cap_output(&long);

        assert!(capped.len() <= OUTPUT_CAP + 4);
        assert!(capped.starts_with("... "));
        assert!(capped.ends_with("FAIL at the end"));
    }

    #[tokio::test]
    async fn mock_drains_its_queue_then_passes() {
        let runner = MockTestRunner::passing().with_failure("1 failing");

        assert!(!runner.run(Path::new("/tmp")).await.unwrap().success);
        assert!(runner.run(Path::new("/tmp")).await.unwrap().success);
        assert_eq!(runner.runs(), 2);
    }
}
