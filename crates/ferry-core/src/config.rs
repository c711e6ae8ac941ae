//! Configuration management for ferry
//!
//! This module provides the repository-level ferry settings: the target
//! working tree, git branch names, code-hosting coordinates, agent model
//! selection, CI polling intervals, and the context files fed to the
//! planning and generation steps.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{FerryError, Result};

/// Repository-level ferry configuration
///
/// Loaded from `.ferry/config.toml` under the current directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FerryConfig {
    /// Target working tree and test invocation
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Git remote and branch names
    #[serde(default)]
    pub git: GitConfig,

    /// Code-hosting coordinates
    #[serde(default)]
    pub github: GithubConfig,

    /// Agent model selection and output budgets
    #[serde(default)]
    pub agent: AgentConfig,

    /// CI polling intervals
    #[serde(default)]
    pub poll: PollSettings,

    /// Context files summarizing the codebase for the agent
    #[serde(default)]
    pub context: ContextConfig,
}

/// Target working tree and test invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Root of the working tree that changes are written to and pushed from
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Optional second codebase read for planning context only
    #[serde(default)]
    pub backend_root: Option<PathBuf>,

    /// Test suite invocation, argv form
    #[serde(default = "default_test_command")]
    pub test_command: Vec<String>,

    /// Files/directories the generated change-set may never touch
    #[serde(default = "default_protected_files")]
    pub protected_files: Vec<String>,
}

/// Git remote and branch names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Remote that feature branches are pushed to
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Branch a change-set is pushed to and merged from
    #[serde(default = "default_head_branch")]
    pub head_branch: String,

    /// Branch pull requests merge into
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
}

/// Code-hosting coordinates
///
/// `owner` and `repo` may be left empty in the file and supplied through the
/// `GITHUB_ORG` / `GITHUB_REPO` environment variables instead. The API token
/// always comes from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Organization or user owning the repository
    #[serde(default)]
    pub owner: String,

    /// Repository name
    #[serde(default)]
    pub repo: String,

    /// REST endpoint base
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

/// Agent model selection and output budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model used for planning and generation
    #[serde(default = "default_model")]
    pub model: String,

    /// Output token cap for code generation
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Output token cap for the implementation plan
    #[serde(default = "default_plan_max_tokens")]
    pub plan_max_tokens: u32,
}

/// CI polling intervals, all in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    /// Wall-clock budget for one poll
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u64,

    /// Delay between cycles while runs are pending
    #[serde(default = "default_pending_delay")]
    pub pending_delay_secs: u64,

    /// Delay after a fetch error or before checks have been scheduled
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

/// Context files summarizing the codebase for the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Files read from `workspace.backend_root`, relative paths
    #[serde(default = "default_backend_files")]
    pub backend_files: Vec<String>,

    /// Files read from `workspace.root`, relative paths
    #[serde(default = "default_frontend_files")]
    pub frontend_files: Vec<String>,
}

// Default value providers
fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_test_command() -> Vec<String> {
    vec![
        "npm".to_string(),
        "test".to_string(),
        "--silent".to_string(),
    ]
}

fn default_protected_files() -> Vec<String> {
    vec![
        ".git".to_string(),
        ".env".to_string(),
        ".ferry".to_string(),
        "package-lock.json".to_string(),
        "Cargo.lock".to_string(),
    ]
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_head_branch() -> String {
    "develop".to_string()
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_model() -> String {
    "opus".to_string()
}

fn default_max_tokens() -> u32 {
    16_000
}

fn default_plan_max_tokens() -> u32 {
    2_000
}

fn default_poll_timeout() -> u64 {
    1_200
}

fn default_pending_delay() -> u64 {
    30
}

fn default_retry_delay() -> u64 {
    10
}

fn default_backend_files() -> Vec<String> {
    vec!["CLAUDE.md".to_string()]
}

fn default_frontend_files() -> Vec<String> {
    vec!["CLAUDE.md".to_string(), "app/page.tsx".to_string()]
}

impl FerryConfig {
    /// Load configuration from `.ferry/config.toml` or use defaults
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(".ferry/config.toml");

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)
                .map_err(|e| FerryError::Config(format!("failed to parse config file: {}", e)))
        } else {
            Ok(Self::default())
        }
    }
}

impl GithubConfig {
    /// Repository owner, environment override first
    pub fn resolved_owner(&self) -> Result<String> {
        resolve_coordinate("GITHUB_ORG", &self.owner, "github.owner")
    }

    /// Repository name, environment override first
    pub fn resolved_repo(&self) -> Result<String> {
        resolve_coordinate("GITHUB_REPO", &self.repo, "github.repo")
    }
}

fn resolve_coordinate(env_key: &str, configured: &str, field: &str) -> Result<String> {
    if let Ok(value) = std::env::var(env_key) {
        if !value.is_empty() {
            return Ok(value);
        }
    }
    if !configured.is_empty() {
        return Ok(configured.to_string());
    }
    Err(FerryError::Config(format!(
        "{} is not set (config file or {})",
        field, env_key
    )))
}

impl Default for FerryConfig {
    fn default() -> Self {
        Self {
            workspace: WorkspaceConfig::default(),
            git: GitConfig::default(),
            github: GithubConfig::default(),
            agent: AgentConfig::default(),
            poll: PollSettings::default(),
            context: ContextConfig::default(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            backend_root: None,
            test_command: default_test_command(),
            protected_files: default_protected_files(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            head_branch: default_head_branch(),
            base_branch: default_base_branch(),
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            api_base: default_api_base(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            plan_max_tokens: default_plan_max_tokens(),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_poll_timeout(),
            pending_delay_secs: default_pending_delay(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            backend_files: default_backend_files(),
            frontend_files: default_frontend_files(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Serializes tests that mutate process environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_are_sensible() {
        let config = FerryConfig::default();
        assert_eq!(config.workspace.root, PathBuf::from("."));
        assert_eq!(config.git.head_branch, "develop");
        assert_eq!(config.git.base_branch, "main");
        assert_eq!(config.agent.model, "opus");
        assert_eq!(config.poll.pending_delay_secs, 30);
        assert!(config.workspace.test_command.starts_with(&["npm".to_string()]));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let toml_str = r#"
            [git]
            head_branch = "staging"

            [poll]
            timeout_secs = 60
        "#;
        let config: FerryConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.git.head_branch, "staging");
        assert_eq!(config.git.base_branch, "main");
        assert_eq!(config.poll.timeout_secs, 60);
        assert_eq!(config.poll.pending_delay_secs, 30);
        assert_eq!(config.agent.max_tokens, 16_000);
    }

    #[test]
    fn load_or_default_without_file() {
        let dir = TempDir::new().unwrap();
        let config = FerryConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.git.remote, "origin");
    }

    #[test]
    fn load_or_default_reads_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".ferry")).unwrap();
        std::fs::write(
            dir.path().join(".ferry/config.toml"),
            "[github]\nowner = \"acme\"\nrepo = \"storefront\"\n",
        )
        .unwrap();

        let config = FerryConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.github.owner, "acme");
        assert_eq!(config.github.repo, "storefront");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".ferry")).unwrap();
        std::fs::write(dir.path().join(".ferry/config.toml"), "[git\n").unwrap();

        let err = FerryConfig::load_or_default(dir.path()).unwrap_err();
        assert!(matches!(err, FerryError::Config(_)));
    }

    #[test]
    fn env_overrides_github_coordinates() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("GITHUB_ORG", "env-org");
        std::env::remove_var("GITHUB_REPO");

        let github = GithubConfig {
            owner: "file-org".to_string(),
            repo: "file-repo".to_string(),
            api_base: default_api_base(),
        };
        assert_eq!(github.resolved_owner().unwrap(), "env-org");
        assert_eq!(github.resolved_repo().unwrap(), "file-repo");

        std::env::remove_var("GITHUB_ORG");
    }

    #[test]
    fn missing_coordinates_are_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("GITHUB_ORG");
        std::env::remove_var("GITHUB_REPO");

        let github = GithubConfig::default();
        assert!(github.resolved_owner().is_err());
        assert!(github.resolved_repo().is_err());
    }
}
