//! Route classification
//!
//! Every question goes to exactly one strategy: a plain chat reply or the
//! tool-using agent. Classification is done by the model behind the
//! [`Classifier`] trait, with a deterministic rule layer in [`Router`] that
//! keeps booking-status questions away from the agent.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::providers::{CompletionRequest, LLMProvider};

use super::context::router_prompt;
use super::intent::is_booking_status_query;

/// Which strategy answers a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Agent,
    Chat,
}

impl RouteDecision {
    /// Interpret a classifier reply.
    ///
    /// Only a bare `agent` (any case, surrounding quotes or punctuation
    /// ignored) selects the agent. Anything else, including empty or
    /// malformed output, falls back to chat so that ambiguous output never
    /// triggers tool use.
    pub fn from_model_output(output: &str) -> Self {
        let word = output
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word == "agent" {
            RouteDecision::Agent
        } else {
            RouteDecision::Chat
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::Agent => "agent",
            RouteDecision::Chat => "chat",
        }
    }
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides the route for a single question.
///
/// Only the question is classified; conversation history is not consulted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, question: &str) -> Result<RouteDecision>;
}

/// Classifier that asks the completion provider.
///
/// The first reply is trusted as-is; there are no retries.
pub struct LlmClassifier {
    provider: Arc<dyn LLMProvider>,
}

impl LlmClassifier {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, question: &str) -> Result<RouteDecision> {
        let reply = self
            .provider
            .complete(CompletionRequest::prompt(router_prompt(question)))
            .await?;
        let decision = RouteDecision::from_model_output(&reply);
        debug!(reply = %reply.trim(), route = %decision, "classified question");
        Ok(decision)
    }
}

/// Rule layer in front of another classifier.
pub struct Router {
    inner: Arc<dyn Classifier>,
    rules_enabled: bool,
}

impl Router {
    pub fn new(inner: Arc<dyn Classifier>) -> Self {
        Self {
            inner,
            rules_enabled: true,
        }
    }

    /// Turn the deterministic rules on or off.
    pub fn with_rules(mut self, enabled: bool) -> Self {
        self.rules_enabled = enabled;
        self
    }
}

#[async_trait]
impl Classifier for Router {
    async fn classify(&self, question: &str) -> Result<RouteDecision> {
        if self.rules_enabled && is_booking_status_query(question) {
            debug!("booking status question, routing to chat");
            return Ok(RouteDecision::Chat);
        }
        self.inner.classify(question).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CabError;
    use crate::providers::MockLLMProvider;

    #[test]
    fn test_only_bare_agent_routes_to_agent() {
        for reply in ["agent", "Agent", "AGENT", " agent\n", "'agent'", "\"Agent\".", "agent."] {
            assert_eq!(
                RouteDecision::from_model_output(reply),
                RouteDecision::Agent,
                "{reply:?}"
            );
        }
    }

    #[test]
    fn test_everything_else_routes_to_chat() {
        for reply in [
            "chat",
            "Chat",
            "Agent-like",
            "",
            "   ",
            "agent chat",
            "No rider has accepted your ride yet, please wait until it confirms.",
            "%%garbage%%",
            "agents",
        ] {
            assert_eq!(
                RouteDecision::from_model_output(reply),
                RouteDecision::Chat,
                "{reply:?}"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(RouteDecision::Agent.to_string(), "agent");
        assert_eq!(RouteDecision::Chat.to_string(), "chat");
    }

    #[tokio::test]
    async fn test_llm_classifier_sends_router_prompt() {
        let mut provider = MockLLMProvider::new();
        provider
            .expect_complete()
            .withf(|request| {
                request.messages.len() == 1
                    && request
                        .last_content()
                        .is_some_and(|p| p.ends_with("User Input:\nfare to the airport?"))
            })
            .times(1)
            .returning(|_| Ok("Agent".to_string()));

        let classifier = LlmClassifier::new(Arc::new(provider));
        let decision = classifier.classify("fare to the airport?").await.unwrap();
        assert_eq!(decision, RouteDecision::Agent);
    }

    #[tokio::test]
    async fn test_llm_classifier_propagates_provider_error() {
        let mut provider = MockLLMProvider::new();
        provider
            .expect_complete()
            .returning(|_| Err(CabError::Provider("timeout".into())));

        let classifier = LlmClassifier::new(Arc::new(provider));
        assert!(classifier.classify("hi").await.is_err());
    }

    #[tokio::test]
    async fn test_router_rule_short_circuits() {
        let mut inner = MockClassifier::new();
        inner.expect_classify().never();

        let router = Router::new(Arc::new(inner));
        let decision = router.classify("when will the cab arrive").await.unwrap();
        assert_eq!(decision, RouteDecision::Chat);
    }

    #[tokio::test]
    async fn test_router_delegates_other_questions() {
        let mut inner = MockClassifier::new();
        inner
            .expect_classify()
            .times(1)
            .returning(|_| Ok(RouteDecision::Agent));

        let router = Router::new(Arc::new(inner));
        let decision = router.classify("plan a trip across town").await.unwrap();
        assert_eq!(decision, RouteDecision::Agent);
    }

    #[tokio::test]
    async fn test_router_rules_disabled() {
        let mut inner = MockClassifier::new();
        inner
            .expect_classify()
            .times(1)
            .returning(|_| Ok(RouteDecision::Agent));

        let router = Router::new(Arc::new(inner)).with_rules(false);
        let decision = router.classify("where is my ride").await.unwrap();
        assert_eq!(decision, RouteDecision::Agent);
    }
}
