//! Anthropic API client for the planning and generation steps
//!
//! Every request is stateless: no conversation history is kept between
//! attempts. Whatever the next attempt needs to know about the previous
//! failure travels as an explicit feedback section inside the prompt.

use crate::auth;
use crate::types::{AnthropicMessage, AnthropicRequest, AnthropicResponse, Completion, Model};
use chrono::Utc;
use ferry_core::{FerryError, Result};
use std::time::Duration;
use tracing::{debug, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 16_000;

// Retry configuration for rate limits and server errors
const MAX_API_RETRIES: u32 = 3;
const RETRY_BACKOFF_SECS: u64 = 10;

/// Client for Anthropic Messages API interactions
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    model: Model,
    max_tokens: u32,
}

impl AgentClient {
    /// Create a new client for the given model
    pub fn new(model: Model) -> Self {
        Self {
            http: reqwest::Client::new(),
            model,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set the output token cap for replies
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> Model {
        self.model
    }

    /// Request a single completion
    ///
    /// Retries on 429 and 5xx with a fixed backoff, honoring a
    /// `retry-after` header when the API sends one.
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<Completion> {
        let auth_token = auth::auth_token()?;

        let request = AnthropicRequest {
            model: self.model.api_name().to_string(),
            max_tokens: self.max_tokens,
            system: Some(system.to_string()),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let mut retries = 0;

        loop {
            debug!(
                "Sending request to Anthropic API (attempt {})",
                retries + 1
            );

            let response = self
                .http
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &auth_token)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request)
                .send()
                .await
                .map_err(|e| FerryError::Api(format!("failed to send request: {}", e)))?;

            let status = response.status();

            if (status.as_u16() == 429 || status.is_server_error()) && retries < MAX_API_RETRIES {
                retries += 1;
                let wait_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(RETRY_BACKOFF_SECS);

                warn!(
                    "Anthropic API returned {}; waiting {}s before retry {}/{}",
                    status, wait_secs, retries, MAX_API_RETRIES
                );
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown".to_string());
                return Err(FerryError::Api(format!(
                    "Anthropic API error {}: {}",
                    status, error_text
                )));
            }

            let parsed: AnthropicResponse = response
                .json()
                .await
                .map_err(|e| FerryError::Api(format!("failed to parse response: {}", e)))?;

            let text = parsed
                .content
                .first()
                .ok_or_else(|| FerryError::Api("no content in response".to_string()))?
                .text
                .clone();

            if let Some(ref usage) = parsed.usage {
                debug!(
                    "Completion received ({} chars, {} input tokens, {} output tokens)",
                    text.len(),
                    usage.input_tokens,
                    usage.output_tokens
                );
            }

            return Ok(Completion {
                text,
                timestamp: Utc::now(),
                usage: parsed.usage,
            });
        }
    }
}

impl Default for AgentClient {
    fn default() -> Self {
        Self::new(Model::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_model_and_budget() {
        let client = AgentClient::new(Model::Opus).with_max_tokens(8_000);
        assert_eq!(client.model(), Model::Opus);
        assert_eq!(client.max_tokens, 8_000);
    }

    #[test]
    fn default_client_uses_default_model() {
        let client = AgentClient::default();
        assert_eq!(client.model(), Model::default());
        assert_eq!(client.max_tokens, DEFAULT_MAX_TOKENS);
    }
}
