//! ReAct agent loop
//!
//! Reasoning → Acting → Reasoning … → Done. Each reasoning step asks the
//! provider for the next move; each acting step runs one tool and records
//! the observation. The loop always terminates: on a final answer, when the
//! iteration or time bound is hit, or when the model keeps producing output
//! that cannot be parsed.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::error::{CabError, Result};
use crate::providers::{CompletionRequest, LLMProvider};
use crate::session::Message;
use crate::tools::{ToolContext, ToolRegistry};

use super::context::{agent_prompt, OBSERVATION_STOP};
use super::parser::{self, AgentOutput};

/// Answer when the iteration or time bound is exhausted.
pub const ITERATION_LIMIT_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";

/// Answer when the model output could not be parsed within the retry budget.
pub const PARSE_FAILURE_ANSWER: &str = "Agent stopped: could not parse the model output.";

/// One completed reasoning iteration.
///
/// Steps exist only for the duration of a single agent run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStep {
    pub thought: String,
    /// Tool name. Empty for a step whose output could not be parsed.
    pub action: String,
    pub action_input: String,
    pub observation: String,
}

impl AgentStep {
    /// Step recording unparseable output so the model can correct itself.
    pub fn invalid(raw_output: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            thought: raw_output.into().trim().to_string(),
            action: String::new(),
            action_input: String::new(),
            observation: format!("Invalid Format: {}", reason),
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.action.is_empty()
    }

    /// The step as the model would have written it, without the observation.
    pub fn log(&self) -> String {
        if self.is_invalid() {
            return self.thought.clone();
        }
        format!(
            "{}\nAction: {}\nAction Input: {}",
            self.thought, self.action, self.action_input
        )
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    FinalAnswer,
    IterationLimit,
    TimeLimit,
    ParseFailures,
}

/// Outcome of one agent run.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub answer: String,
    pub steps: Vec<AgentStep>,
    /// Provider calls made.
    pub iterations: u32,
    pub stop_reason: StopReason,
}

/// Bounds for a run.
#[derive(Debug, Clone)]
pub struct AgentLoopConfig {
    pub max_iterations: u32,
    pub max_execution_time: Option<Duration>,
    pub max_parse_retries: u32,
}

impl Default for AgentLoopConfig {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for AgentLoopConfig {
    fn from(config: &AgentConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            max_execution_time: config.max_execution_secs.map(Duration::from_secs),
            max_parse_retries: config.max_parse_retries,
        }
    }
}

struct PendingAction {
    thought: String,
    tool: String,
    input: String,
}

enum State {
    Reasoning,
    Acting(PendingAction),
    Done(StopReason, String),
}

/// Tool-using response strategy.
pub struct AgentLoop {
    provider: Arc<dyn LLMProvider>,
    tools: ToolRegistry,
    config: AgentLoopConfig,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn LLMProvider>, tools: ToolRegistry, config: AgentLoopConfig) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer `question` with the reasoning loop.
    ///
    /// # Errors
    ///
    /// Only provider failures are returned. Tool failures become
    /// observations and parse failures are retried, then answered with
    /// [`PARSE_FAILURE_ANSWER`].
    pub async fn respond(
        &self,
        question: &str,
        history: &[Message],
        ctx: &ToolContext,
    ) -> Result<String> {
        Ok(self.run(question, history, ctx).await?.answer)
    }

    /// Like [`AgentLoop::respond`] but returns the whole run.
    pub async fn run(
        &self,
        question: &str,
        history: &[Message],
        ctx: &ToolContext,
    ) -> Result<AgentRun> {
        let started = Instant::now();
        let mut steps: Vec<AgentStep> = Vec::new();
        let mut iterations: u32 = 0;
        let mut parse_failures: u32 = 0;
        let mut state = State::Reasoning;

        loop {
            state = match state {
                State::Reasoning => {
                    if iterations >= self.config.max_iterations {
                        State::Done(StopReason::IterationLimit, ITERATION_LIMIT_ANSWER.into())
                    } else if self
                        .config
                        .max_execution_time
                        .is_some_and(|limit| started.elapsed() >= limit)
                    {
                        State::Done(StopReason::TimeLimit, ITERATION_LIMIT_ANSWER.into())
                    } else {
                        iterations += 1;
                        debug!(iteration = iterations, "reasoning: calling provider");

                        let prompt = agent_prompt(&self.tools, history, question, &steps);
                        let request =
                            CompletionRequest::prompt(prompt).with_stop(OBSERVATION_STOP);
                        let output = self.provider.complete(request).await?;

                        match parser::parse(&output) {
                            Ok(AgentOutput::Finish { answer }) => {
                                State::Done(StopReason::FinalAnswer, answer)
                            }
                            Ok(AgentOutput::Act {
                                thought,
                                tool,
                                input,
                            }) => State::Acting(PendingAction {
                                thought,
                                tool,
                                input,
                            }),
                            Err(err) => {
                                parse_failures += 1;
                                warn!(
                                    iteration = iterations,
                                    failures = parse_failures,
                                    error = %err,
                                    "unparseable agent output"
                                );
                                if parse_failures > self.config.max_parse_retries {
                                    State::Done(
                                        StopReason::ParseFailures,
                                        PARSE_FAILURE_ANSWER.into(),
                                    )
                                } else {
                                    steps.push(AgentStep::invalid(output, err));
                                    State::Reasoning
                                }
                            }
                        }
                    }
                }
                State::Acting(action) => {
                    let observation = self.observe(&action, ctx).await;
                    steps.push(AgentStep {
                        thought: action.thought,
                        action: action.tool,
                        action_input: action.input,
                        observation,
                    });
                    State::Reasoning
                }
                State::Done(stop_reason, answer) => {
                    info!(
                        iterations,
                        steps = steps.len(),
                        stop_reason = ?stop_reason,
                        "agent finished"
                    );
                    return Ok(AgentRun {
                        answer,
                        steps,
                        iterations,
                        stop_reason,
                    });
                }
            };
        }
    }

    /// Run the requested tool; failures become observation text.
    async fn observe(&self, action: &PendingAction, ctx: &ToolContext) -> String {
        if !self.tools.contains(&action.tool) {
            warn!(tool = %action.tool, "model requested unknown tool");
            return format!(
                "{} is not a valid tool, try one of [{}].",
                action.tool,
                self.tools.names().join(", ")
            );
        }

        debug!(tool = %action.tool, input = %action.input, "acting: invoking tool");
        match self.tools.invoke(&action.tool, &action.input, ctx).await {
            Ok(output) => output,
            Err(err) => {
                warn!(tool = %action.tool, error = %err, "tool failed");
                let message = match err {
                    CabError::Tool(message) => message,
                    other => other.to_string(),
                };
                format!("tool error: {}", message)
            }
        }
    }
}
