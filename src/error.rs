//! Error types for cabchat
//!
//! A single error enum covers every failure the library can surface. Only
//! [`CabError::Config`] is fatal; the conversation pipeline turns everything
//! else into a readable answer string.

use thiserror::Error;

/// Errors produced by cabchat components.
#[derive(Debug, Error)]
pub enum CabError {
    /// Invalid or missing configuration. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The completion provider failed or returned an unusable body.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The completion provider answered with a non-success HTTP status.
    #[error("Provider returned HTTP {status}: {body}")]
    ProviderStatus { status: u16, body: String },

    /// A tool invocation failed.
    #[error("Tool error: {0}")]
    Tool(String),

    /// Model output did not follow the expected grammar.
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CabError {
    /// Whether the process must refuse to serve requests because of this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CabError::Config(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CabError>;
