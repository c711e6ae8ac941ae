//! # ferry-agent
//!
//! Anthropic API client and change-set handling for ferry.
//!
//! This crate provides:
//! - A stateless Messages API client with retry (auth from the environment)
//! - The `===FILE:` / `===END===` change-set wire format
//! - Truncation heuristics for generated files
//! - All-or-nothing application of a change-set to a working tree

mod auth;
mod changeset;
mod client;
mod truncation;
mod types;
mod writer;

pub use auth::auth_token;
pub use changeset::{
    parse_change_set, ChangeSet, FileChange, END_MARKER, FILE_MARKER_PREFIX, MARKER_SUFFIX,
};
pub use client::AgentClient;
pub use truncation::{is_source_path, looks_complete, truncated_paths};
pub use types::{
    AnthropicContent, AnthropicMessage, AnthropicRequest, AnthropicResponse, Completion, Model,
    Usage,
};
pub use writer::{apply_change_set, validate_path};
