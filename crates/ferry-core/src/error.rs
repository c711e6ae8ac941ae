//! Unified error types for ferry

use thiserror::Error;

/// Unified error type for all ferry operations
#[derive(Error, Debug)]
pub enum FerryError {
    // Git errors
    #[error("Git command failed: {0}")]
    Git(String),

    // Agent API errors
    #[error("Agent API error: {0}")]
    Api(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    // Code-hosting errors
    #[error("Hosting API error: {0}")]
    Hosting(String),

    #[error("Pull request creation rejected: {0}")]
    PullRequest(String),

    #[error("Merge rejected: {0}")]
    Merge(String),

    #[error("Required checks failed: {0}")]
    ChecksFailed(String),

    #[error("Timed out waiting for checks: {0}")]
    ChecksTimedOut(String),

    // File errors
    #[error("Invalid path: {0}")]
    PathValidation(String),

    #[error("File write failed: {0}")]
    Write(String),

    // Test runner errors
    #[error("Test runner error: {0}")]
    TestRunner(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Result type alias using FerryError
pub type Result<T> = std::result::Result<T, FerryError>;
