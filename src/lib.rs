//! cabchat - session-aware chat backend for RideOnCabio
//!
//! Each question is classified once and answered either by a plain chat
//! completion or by a ReAct agent that can search the web. Conversation
//! history is kept per session in memory.
//!
//! - [`agent`]: routing, chat and agent strategies, and the pipeline tying them together
//! - [`api`]: the axum HTTP surface
//! - [`providers`]: completion providers (Hugging Face)
//! - [`tools`]: tools available to the agent (web search)
//! - [`session`]: in-memory conversation history

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod providers;
pub mod session;
pub mod tools;

pub use agent::{ConversationPipeline, RouteDecision};
pub use config::Config;
pub use error::{CabError, Result};
