//! Prompt construction
//!
//! Builds the text sent to the provider for each of the three model calls:
//! route classification, chat replies and ReAct agent steps.

use crate::session::Message;
use crate::tools::ToolRegistry;

use super::AgentStep;

/// Persona for conversational replies. Length and booking rules are only
/// advisory here; see `ChatResponder` for the enforced booking override.
pub const CHAT_PERSONA: &str = "You are a helpful and friendly AI assistant for RideOnCabio. \
Answer the user's questions clearly and concisely, in 30 words or less. \
If the user asks about their booked cab or vehicle, you must reply with: \
'your cab is not confirmed yet pls wait until it confirms'";

const ROUTER_TEMPLATE: &str = r#"You are a helpful assistant for RideOnCabio, a small demo ride-sharing project.

Your job is to classify the user's input as either 'agent' or 'chat'.

Guidelines:
- If the user asks about their ride, cab status, driver, or booking (for example: "where is my ride", "is my cab confirmed", "who is my driver", "when will the cab arrive"), classify it as 'chat'.
- If the user talks about trip planning, fare estimation, distance, location routes, or any question that requires reasoning or external data, classify it as 'agent'.
- For greetings, small talk, or general chat, classify it as 'chat'.

Output format:
Return only one word: either 'agent' or 'chat'.

User Input:
{input}"#;

const REACT_TEMPLATE: &str = r#"Answer the following questions as best you can. You have access to the following tools:

{tools}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

Begin!
{history}
Question: {input}
Thought:{agent_scratchpad}"#;

/// Stop sequence that keeps the model from inventing its own observations.
pub const OBSERVATION_STOP: &str = "\nObservation:";

/// Classification prompt for `question`.
pub fn router_prompt(question: &str) -> String {
    ROUTER_TEMPLATE.replace("{input}", question)
}

/// System persona, prior turns, then the new question.
pub fn chat_messages(persona: &str, history: &[Message], question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(persona));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(question));
    messages
}

/// Full ReAct prompt for the next reasoning step.
pub fn agent_prompt(
    tools: &ToolRegistry,
    history: &[Message],
    question: &str,
    steps: &[AgentStep],
) -> String {
    // Single pass so text inside the question or observations is never
    // mistaken for a placeholder.
    let mut prompt = String::with_capacity(REACT_TEMPLATE.len() + question.len());
    let mut rest = REACT_TEMPLATE;
    while let Some(start) = rest.find('{') {
        prompt.push_str(&rest[..start]);
        let after = &rest[start..];
        let Some(end) = after.find('}') else {
            prompt.push_str(after);
            rest = "";
            break;
        };
        match &after[1..end] {
            "tools" => prompt.push_str(&tools.describe()),
            "tool_names" => prompt.push_str(&tools.names().join(", ")),
            "history" => prompt.push_str(&render_history(history)),
            "input" => prompt.push_str(question),
            "agent_scratchpad" => prompt.push_str(&scratchpad(steps)),
            other => {
                prompt.push('{');
                prompt.push_str(other);
                prompt.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    prompt.push_str(rest);
    prompt
}

fn render_history(history: &[Message]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let mut out = String::from("\nPrevious conversation:\n");
    for message in history {
        out.push_str(message.role.as_str());
        out.push_str(": ");
        out.push_str(&message.content);
        out.push('\n');
    }
    out
}

/// Replay earlier steps in the format the model produced them.
pub fn scratchpad(steps: &[AgentStep]) -> String {
    let mut out = String::new();
    for step in steps {
        out.push(' ');
        out.push_str(&step.log());
        out.push_str("\nObservation: ");
        out.push_str(&step.observation);
        out.push_str("\nThought:");
    }
    out
}
