//! Agent module - Routing and response strategies
//!
//! This module turns a user's question into an answer. For each request the
//! pipeline:
//!
//! - Loads the session's history
//! - Classifies the question as `agent` or `chat`
//! - Answers with the tool-using ReAct loop or a single chat completion
//! - Records the exchange in the session
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌───────────────┐
//! │ Conversation │────>│   Router    │────>│  LLMProvider  │
//! │   Pipeline   │     │ (rules+LLM) │     │ (HuggingFace) │
//! └──────────────┘     └─────────────┘     └───────────────┘
//!        │                                         ▲
//!        ├──────── chat ──>┌───────────────┐       │
//!        │                 │ ChatResponder │───────┤
//!        │                 └───────────────┘       │
//!        ├──────── agent ─>┌───────────────┐       │
//!        │                 │   AgentLoop   │───────┘
//!        ▼                 └───────────────┘
//! ┌──────────────┐                 │
//! │   Session    │                 ▼
//! │   Manager    │         ┌───────────────┐
//! └──────────────┘         │ ToolRegistry  │
//!                          └───────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use cabchat::agent::ConversationPipeline;
//! use cabchat::config::Config;
//!
//! async fn answer() -> cabchat::error::Result<()> {
//!     let config = Config::load(None)?;
//!     let pipeline = ConversationPipeline::from_config(&config)?;
//!
//!     let reply = pipeline.respond("what's the fare to the airport?", "web:42").await;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod context;
pub mod intent;
mod r#loop;
pub mod parser;
pub mod pipeline;
pub mod router;

pub use chat::ChatResponder;
pub use intent::{is_booking_status_query, BOOKING_STATUS_REPLY};
pub use pipeline::{ConversationPipeline, ERROR_ANSWER_PREFIX};
pub use r#loop::{
    AgentLoop, AgentLoopConfig, AgentRun, AgentStep, StopReason, ITERATION_LIMIT_ANSWER,
    PARSE_FAILURE_ANSWER,
};
pub use router::{Classifier, LlmClassifier, RouteDecision, Router};
