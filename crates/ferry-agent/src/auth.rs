//! Authentication for the Anthropic API
//!
//! Two sources, checked in order:
//! 1. `CLAUDE_CODE_OAUTH_TOKEN` (subscription access, zero API cost)
//! 2. `ANTHROPIC_API_KEY` (standard API access)

use ferry_core::{FerryError, Result};
use std::env;
use tracing::debug;

const TOKEN_SOURCES: &[(&str, &str)] = &[
    ("CLAUDE_CODE_OAUTH_TOKEN", "OAuth token"),
    ("ANTHROPIC_API_KEY", "API key"),
];

/// Resolve the Anthropic API credential from the environment
pub fn auth_token() -> Result<String> {
    for (var, label) in TOKEN_SOURCES {
        if let Ok(token) = env::var(var) {
            if !token.is_empty() {
                debug!("Authenticating with {}", label);
                return Ok(token);
            }
        }
    }

    Err(FerryError::Auth(
        "no Anthropic credential found; set CLAUDE_CODE_OAUTH_TOKEN or ANTHROPIC_API_KEY"
            .to_string(),
    ))
}
