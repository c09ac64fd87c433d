//! Providers module - Text generation backends
//!
//! A provider turns a list of chat messages into generated text. The rest of
//! the crate only depends on the [`LLMProvider`] trait, so the router, the
//! chat responder and the agent loop can all be driven by scripted providers
//! in tests.

pub mod huggingface;

pub use huggingface::HuggingFaceProvider;

use async_trait::async_trait;

use crate::error::Result;
use crate::session::Message;

/// A single completion call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    /// Sequences at which generation should stop.
    pub stop: Vec<String>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            stop: Vec::new(),
        }
    }

    /// Single user message request.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(vec![Message::user(text)])
    }

    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop.push(stop.into());
        self
    }

    /// Content of the last message, usually the user's input.
    pub fn last_content(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }
}

/// Capability boundary to an external text-generation service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate text for `request`.
    ///
    /// Any failure (network, quota, credentials, malformed body) is returned
    /// as an error; callers decide whether it is recoverable.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}
