//! Code-hosting REST client
//!
//! The three calls ferry needs against the GitHub REST API: create a pull
//! request, list a commit's check runs, merge a pull request. [`CodeHost`]
//! is the seam the poller and publisher run against; [`MockHost`] provides
//! scripted responses for tests.

use async_trait::async_trait;
use ferry_core::{FerryError, Result};
use serde::Deserialize;
use std::sync::Mutex;
use tracing::debug;

use crate::types::{CheckRun, PullRequest, PullRequestSpec};

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("ferry/", env!("CARGO_PKG_VERSION"));

/// Resolve the hosting API token from the environment
pub fn host_token() -> Result<String> {
    match std::env::var("GITHUB_TOKEN") {
        Ok(token) if !token.is_empty() => Ok(token),
        _ => Err(FerryError::Auth("GITHUB_TOKEN is not set".to_string())),
    }
}

/// Operations ferry needs from the code-hosting service
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Open a pull request; only a 201 response counts as created
    async fn create_pull_request(&self, spec: &PullRequestSpec) -> Result<PullRequest>;

    /// Fetch the full current check-run set for a commit
    async fn list_check_runs(&self, sha: &str) -> Result<Vec<CheckRun>>;

    /// Merge a pull request; only a 200 response counts as merged
    async fn merge_pull_request(&self, number: u64) -> Result<()>;
}

/// GitHub REST implementation of [`CodeHost`]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPullRequest {
    number: u64,
    html_url: String,
    head: HeadRef,
}

#[derive(Debug, Deserialize)]
struct HeadRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CheckRunsPage {
    check_runs: Vec<CheckRun>,
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    message: String,
}

impl GitHubClient {
    pub fn new(
        api_base: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FerryError::Hosting(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.into(),
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
        })
    }

    fn url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, tail
        )
    }

    fn authorization(&self) -> String {
        format!("token {}", self.token)
    }
}

/// Status plus the remote's own message, verbatim where parsable
async fn remote_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<RemoteError>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    format!("{}: {}", status, message.trim())
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn create_pull_request(&self, spec: &PullRequestSpec) -> Result<PullRequest> {
        debug!("Creating pull request {} -> {}", spec.head, spec.base);

        let response = self
            .http
            .post(self.url("pulls"))
            .header("Authorization", self.authorization())
            .header("Accept", ACCEPT_HEADER)
            .json(spec)
            .send()
            .await
            .map_err(|e| FerryError::Hosting(format!("create pull request: {}", e)))?;

        if response.status().as_u16() != 201 {
            return Err(FerryError::PullRequest(remote_message(response).await));
        }

        let created: CreatedPullRequest = response
            .json()
            .await
            .map_err(|e| FerryError::Hosting(format!("parse pull request response: {}", e)))?;

        Ok(PullRequest {
            number: created.number,
            html_url: created.html_url,
            head_sha: created.head.sha,
        })
    }

    async fn list_check_runs(&self, sha: &str) -> Result<Vec<CheckRun>> {
        let response = self
            .http
            .get(self.url(&format!("commits/{}/check-runs", sha)))
            .header("Authorization", self.authorization())
            .header("Accept", ACCEPT_HEADER)
            .send()
            .await
            .map_err(|e| FerryError::Hosting(format!("fetch check runs: {}", e)))?;

        if !response.status().is_success() {
            return Err(FerryError::Hosting(remote_message(response).await));
        }

        let page: CheckRunsPage = response
            .json()
            .await
            .map_err(|e| FerryError::Hosting(format!("parse check runs: {}", e)))?;

        Ok(page.check_runs)
    }

    async fn merge_pull_request(&self, number: u64) -> Result<()> {
        let response = self
            .http
            .put(self.url(&format!("pulls/{}/merge", number)))
            .header("Authorization", self.authorization())
            .header("Accept", ACCEPT_HEADER)
            .json(&serde_json::json!({ "merge_method": "merge" }))
            .send()
            .await
            .map_err(|e| FerryError::Hosting(format!("merge pull request: {}", e)))?;

        if response.status().as_u16() != 200 {
            return Err(FerryError::Merge(remote_message(response).await));
        }

        Ok(())
    }
}

/// One scripted check-run fetch outcome
enum FetchStep {
    Runs(Vec<CheckRun>),
    Error(String),
}

struct FetchScript {
    steps: Vec<FetchStep>,
    position: usize,
}

/// Scripted [`CodeHost`] for tests
///
/// Check-run fetches walk the scripted steps in order and repeat the last
/// one forever; with no steps at all, fetches return an empty set. Every
/// call is recorded so tests can assert what did (and did not) happen.
pub struct MockHost {
    pull_request: Option<PullRequest>,
    creation_rejection: String,
    fetch_script: Mutex<FetchScript>,
    merge_rejection: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            pull_request: Some(PullRequest {
                number: 1,
                html_url: "https://github.com/mock/repo/pull/1".to_string(),
                head_sha: "headsha000".to_string(),
            }),
            creation_rejection: String::new(),
            fetch_script: Mutex::new(FetchScript {
                steps: Vec::new(),
                position: 0,
            }),
            merge_rejection: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pull_request(mut self, pr: PullRequest) -> Self {
        self.pull_request = Some(pr);
        self
    }

    pub fn rejecting_creation(mut self, message: &str) -> Self {
        self.pull_request = None;
        self.creation_rejection = message.to_string();
        self
    }

    /// Append one scripted check-run snapshot
    pub fn with_check_runs(self, runs: Vec<CheckRun>) -> Self {
        self.fetch_script
            .lock()
            .unwrap()
            .steps
            .push(FetchStep::Runs(runs));
        self
    }

    /// Append one scripted transport failure
    pub fn with_fetch_error(self, message: &str) -> Self {
        self.fetch_script
            .lock()
            .unwrap()
            .steps
            .push(FetchStep::Error(message.to_string()));
        self
    }

    pub fn rejecting_merge(mut self, message: &str) -> Self {
        self.merge_rejection = Some(message.to_string());
        self
    }

    /// All calls so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls starting with the given verb
    pub fn count_of(&self, verb: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(verb))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CodeHost for MockHost {
    async fn create_pull_request(&self, spec: &PullRequestSpec) -> Result<PullRequest> {
        self.record(format!("create {} -> {}", spec.head, spec.base));
        match &self.pull_request {
            Some(pr) => Ok(pr.clone()),
            None => Err(FerryError::PullRequest(self.creation_rejection.clone())),
        }
    }

    async fn list_check_runs(&self, sha: &str) -> Result<Vec<CheckRun>> {
        self.record(format!("checks {}", sha));

        let mut script = self.fetch_script.lock().unwrap();
        if script.steps.is_empty() {
            return Ok(Vec::new());
        }

        let index = script.position.min(script.steps.len() - 1);
        script.position += 1;

        match &script.steps[index] {
            FetchStep::Runs(runs) => Ok(runs.clone()),
            FetchStep::Error(message) => Err(FerryError::Hosting(message.clone())),
        }
    }

    async fn merge_pull_request(&self, number: u64) -> Result<()> {
        self.record(format!("merge {}", number));
        match &self.merge_rejection {
            Some(message) => Err(FerryError::Merge(message.clone())),
            None => Ok(()),
        }
    }
}
