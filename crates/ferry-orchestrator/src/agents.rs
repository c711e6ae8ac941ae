//! Planning and generation collaborators
//!
//! Both are seams: the orchestrator only sees the traits, tests script them,
//! and the real implementations ride the Anthropic Messages API via
//! [`AgentClient`]. The generator is memoryless across attempts except for
//! the single feedback report it is handed.

use async_trait::async_trait;
use ferry_agent::{parse_change_set, AgentClient, ChangeSet};
use ferry_core::Result;
use tracing::{debug, info};

use crate::attempt::FailureReport;
use crate::context::ProjectContext;
use crate::prompt;

/// Produces the human-readable implementation plan
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, request: &str, context: &ProjectContext) -> Result<String>;
}

/// Produces a fresh change-set for the request
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        request: &str,
        context: &ProjectContext,
        feedback: Option<&FailureReport>,
    ) -> Result<ChangeSet>;
}

pub struct FeaturePlanner {
    client: AgentClient,
}

impl FeaturePlanner {
    pub fn new(client: AgentClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Planner for FeaturePlanner {
    async fn plan(&self, request: &str, context: &ProjectContext) -> Result<String> {
        let prompt = prompt::build_plan_prompt(request, context);
        debug!("Plan prompt: {} chars", prompt.len());

        let completion = self
            .client
            .complete(prompt::PLAN_SYSTEM_PROMPT, &prompt)
            .await?;
        Ok(completion.text)
    }
}

pub struct FeatureCoder {
    client: AgentClient,
}

impl FeatureCoder {
    pub fn new(client: AgentClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Generator for FeatureCoder {
    async fn generate(
        &self,
        request: &str,
        context: &ProjectContext,
        feedback: Option<&FailureReport>,
    ) -> Result<ChangeSet> {
        let prompt = prompt::build_change_prompt(request, context, feedback);
        debug!(
            "Change prompt: {} chars, feedback: {}",
            prompt.len(),
            feedback.is_some()
        );

        let completion = self
            .client
            .complete(prompt::CODER_SYSTEM_PROMPT, &prompt)
            .await?;
        let set = parse_change_set(&completion.text);
        info!("Generated {} file(s)", set.len());
        Ok(set)
    }
}
