//! Parser for ReAct-formatted model output.
//!
//! The model either requests an action:
//!
//! ```text
//! I should look this up.
//! Action: web_search
//! Action Input: fare from downtown to the airport
//! ```
//!
//! or finishes:
//!
//! ```text
//! I now know the final answer
//! Final Answer: Around $35.
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::error::CabError;

const FINAL_ANSWER: &str = "Final Answer:";

static ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:\s*(.*?)\s*Action\s*\d*\s*Input\s*\d*\s*:\s*(.*)")
        .expect("action pattern is valid")
});

static ACTION_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Action\s*\d*\s*:").expect("action marker pattern is valid"));

static LEADING_THOUGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*Thought\s*:\s*").expect("thought pattern is valid"));

/// What the model asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutput {
    /// Invoke `tool` with `input`.
    Act {
        thought: String,
        tool: String,
        input: String,
    },
    /// Stop with `answer`.
    Finish { answer: String },
}

/// Why model output could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Missing 'Action:' after 'Thought:'")]
    MissingAction,

    #[error("Missing 'Action Input:' after 'Action:'")]
    MissingActionInput,

    #[error("Parsing LLM output produced both a final answer and a parse-able action")]
    FinalAnswerAndAction,

    #[error("Final answer is empty")]
    EmptyFinalAnswer,
}

impl From<ParseError> for CabError {
    fn from(err: ParseError) -> Self {
        CabError::Parse(err.to_string())
    }
}

/// Parse one model completion.
pub fn parse(text: &str) -> Result<AgentOutput, ParseError> {
    let includes_answer = text.contains(FINAL_ANSWER);

    if let Some(caps) = ACTION.captures(text) {
        if includes_answer {
            return Err(ParseError::FinalAnswerAndAction);
        }
        let (Some(whole), Some(tool), Some(input)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            return Err(ParseError::MissingActionInput);
        };

        let tool = clean_tool_name(tool.as_str());
        if tool.is_empty() {
            return Err(ParseError::MissingAction);
        }

        return Ok(AgentOutput::Act {
            thought: clean_thought(&text[..whole.start()]),
            tool,
            input: clean_input(input.as_str()),
        });
    }

    if includes_answer {
        let answer = text
            .rsplit(FINAL_ANSWER)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        if answer.is_empty() {
            return Err(ParseError::EmptyFinalAnswer);
        }
        return Ok(AgentOutput::Finish { answer });
    }

    if ACTION_ONLY.is_match(text) {
        Err(ParseError::MissingActionInput)
    } else {
        Err(ParseError::MissingAction)
    }
}

fn clean_thought(text: &str) -> String {
    LEADING_THOUGHT.replace(text, "").trim().to_string()
}

fn clean_tool_name(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| matches!(c, '[' | ']' | '`' | '"' | '\''))
        .trim()
        .to_string()
}

fn clean_input(raw: &str) -> String {
    // Models that ignore the stop sequence keep writing their own observation.
    let raw = match raw.find("\nObservation") {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    raw.trim().trim_matches('"').trim().to_string()
}
