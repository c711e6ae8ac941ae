//! # ferry-core
//!
//! Shared error and configuration types for ferry, a pipeline that carries a
//! natural-language feature request through plan, code generation, local
//! validation and tests, and a pull-request merge gated on CI.
//!
//! Everything here is plumbing used by every other ferry crate: the unified
//! [`FerryError`] type with its [`Result`] alias, and [`FerryConfig`] loaded
//! from `.ferry/config.toml`.

mod config;
mod error;

pub use config::{
    AgentConfig, ContextConfig, FerryConfig, GitConfig, GithubConfig, PollSettings,
    WorkspaceConfig,
};
pub use error::{FerryError, Result};
