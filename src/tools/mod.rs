//! Tools module - Actions the agent can take
//!
//! A [`Tool`] takes a free-text input (the agent's `Action Input`) and
//! returns text that is fed back to the model as an observation. Tools are
//! collected in a [`ToolRegistry`], which is the agent's only way to reach
//! them.

pub mod web_search;

pub use web_search::WebSearchTool;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{CabError, Result};

/// Per-invocation context handed to tools.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Session that triggered the call, for log correlation.
    pub session_id: Option<String>,
}

impl ToolContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// An action the agent may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses in `Action:` lines.
    fn name(&self) -> &str;

    /// One-line description shown to the model.
    fn description(&self) -> &str;

    /// Run the tool on the raw action input.
    async fn execute(&self, input: &str, ctx: &ToolContext) -> Result<String>;
}

/// Named collection of tools.
///
/// Tools are kept in name order so the prompt listing is stable.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// `name: description` lines for the agent prompt.
    pub fn describe(&self) -> String {
        self.tools
            .values()
            .map(|tool| format!("{}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Invoke the tool called `name` with `input`.
    ///
    /// # Errors
    ///
    /// Returns [`CabError::Tool`] for an unknown name, or whatever the tool
    /// itself fails with.
    pub async fn invoke(&self, name: &str, input: &str, ctx: &ToolContext) -> Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| CabError::Tool(format!("unknown tool '{}'", name)))?;

        tracing::info!(
            tool = name,
            session_id = ctx.session_id.as_deref().unwrap_or("-"),
            "invoking tool"
        );
        tool.execute(input, ctx).await
    }
}
