//! Conversation pipeline: classify, dispatch, record.

use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::providers::{HuggingFaceProvider, LLMProvider};
use crate::session::{Message, SessionManager};
use crate::tools::{ToolContext, ToolRegistry, WebSearchTool};

use super::chat::ChatResponder;
use super::r#loop::{AgentLoop, AgentLoopConfig};
use super::router::{Classifier, LlmClassifier, RouteDecision, Router};

/// Prefix of the answer returned when a request fails.
pub const ERROR_ANSWER_PREFIX: &str = "An error occurred: ";

/// Single entry point for answering a user's question within a session.
///
/// # Example
///
/// ```rust,ignore
/// use cabchat::agent::ConversationPipeline;
/// use cabchat::config::Config;
///
/// let config = Config::load(None)?;
/// let pipeline = ConversationPipeline::from_config(&config)?;
/// let answer = pipeline.respond("hi", "session-1").await;
/// ```
pub struct ConversationPipeline {
    sessions: SessionManager,
    classifier: Arc<dyn Classifier>,
    chat: ChatResponder,
    agent: AgentLoop,
}

impl ConversationPipeline {
    pub fn new(
        sessions: SessionManager,
        classifier: Arc<dyn Classifier>,
        chat: ChatResponder,
        agent: AgentLoop,
    ) -> Self {
        Self {
            sessions,
            classifier,
            chat,
            agent,
        }
    }

    /// Wire the Hugging Face provider and the web search tool from config.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CabError::Config`] when the provider has no
    /// API key, or an HTTP error if a client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider: Arc<dyn LLMProvider> =
            Arc::new(HuggingFaceProvider::from_config(&config.provider)?);
        let tools =
            ToolRegistry::new().with_tool(Arc::new(WebSearchTool::from_config(&config.search)?));
        Ok(Self::with_provider(config, provider, tools))
    }

    /// Wire every strategy around one provider and tool set.
    pub fn with_provider(
        config: &Config,
        provider: Arc<dyn LLMProvider>,
        tools: ToolRegistry,
    ) -> Self {
        let enforce = config.chat.enforce_booking_override;
        let classifier = Router::new(Arc::new(LlmClassifier::new(Arc::clone(&provider))))
            .with_rules(enforce);
        let chat = ChatResponder::new(Arc::clone(&provider)).with_booking_override(enforce);
        let agent = AgentLoop::new(provider, tools, AgentLoopConfig::from(&config.agent));

        Self::new(SessionManager::new(), Arc::new(classifier), chat, agent)
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Answer `question` in the session `session_id`.
    ///
    /// Never fails: provider and tool errors are returned as an answer
    /// starting with [`ERROR_ANSWER_PREFIX`]. Successful exchanges are
    /// appended to the session as a user turn and an assistant turn; failed
    /// ones are not recorded.
    pub async fn respond(&self, question: &str, session_id: &str) -> String {
        let request_id = Uuid::new_v4();
        let span = info_span!("respond", session_id = %session_id, request_id = %request_id);

        async move {
            let handle = self.sessions.get_or_create(session_id).await;
            // Held for the whole exchange so turns of one session never interleave
            let mut session = handle.lock().await;

            let result = self.answer(question, session_id, session.history()).await;
            match result {
                Ok((route, answer)) => {
                    session.record_exchange(question, answer.as_str());
                    info!(route = %route, turns = session.len(), "answered");
                    answer
                }
                Err(err) => {
                    warn!(error = %err, "failed to answer");
                    format!("{}{}", ERROR_ANSWER_PREFIX, err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn answer(
        &self,
        question: &str,
        session_id: &str,
        history: &[Message],
    ) -> Result<(RouteDecision, String)> {
        let route = self.classifier.classify(question).await?;
        let answer = match route {
            RouteDecision::Agent => {
                let ctx = ToolContext::new().with_session(session_id);
                self.agent.respond(question, history, &ctx).await?
            }
            RouteDecision::Chat => self.chat.respond(question, history).await?,
        };
        Ok((route, answer))
    }
}
