//! Conversational reply strategy

use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::providers::{CompletionRequest, LLMProvider};
use crate::session::Message;

use super::context::{chat_messages, CHAT_PERSONA};
use super::intent::{is_booking_status_query, BOOKING_STATUS_REPLY};

/// Single-shot chat replies with a fixed persona.
///
/// The persona asks for answers of 30 words or less; that bound is left to
/// the model. The booking-status reply is enforced here unless disabled with
/// [`ChatResponder::with_booking_override`].
pub struct ChatResponder {
    provider: Arc<dyn LLMProvider>,
    persona: String,
    enforce_booking_override: bool,
}

impl ChatResponder {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            persona: CHAT_PERSONA.to_string(),
            enforce_booking_override: true,
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn with_booking_override(mut self, enforce: bool) -> Self {
        self.enforce_booking_override = enforce;
        self
    }

    /// Reply to `question` given the prior turns of the session.
    ///
    /// The provider's text is returned verbatim.
    pub async fn respond(&self, question: &str, history: &[Message]) -> Result<String> {
        if self.enforce_booking_override && is_booking_status_query(question) {
            debug!("booking status question, answering with fixed reply");
            return Ok(BOOKING_STATUS_REPLY.to_string());
        }

        let messages = chat_messages(&self.persona, history, question);
        self.provider.complete(CompletionRequest::new(messages)).await
    }
}
