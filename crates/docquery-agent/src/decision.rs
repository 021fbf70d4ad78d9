//! Parsing chat model output into decisions.

use serde::Deserialize;
use serde_json::Value;

use crate::error::AgentError;

/// What the model chose to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Search { query: String },
    Post { message: String, channel: Option<String> },
    FinalAnswer(String),
}

/// One parsed model turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Free-form reasoning; logged, never interpreted
    pub thoughts: String,
    pub action: Action,
}

#[derive(Deserialize)]
struct RawDecision {
    #[serde(default)]
    thoughts: Option<Value>,
    action: String,
    #[serde(default)]
    action_input: Option<Value>,
    #[serde(default)]
    channel: Option<String>,
}

/// Parse a model reply of the form
/// `{"thoughts": ..., "action": ..., "action_input": ..., "channel"?: ...}`.
///
/// Surrounding prose and markdown fences are tolerated. Action names are
/// matched case-insensitively against `Search`/`SearchTool`,
/// `Post`/`SlackTool` and `FinalAnswer`.
pub fn parse_decision(response: &str) -> Result<Decision, AgentError> {
    let json_str = extract_json(response);

    let raw: RawDecision = serde_json::from_str(json_str)
        .map_err(|e| AgentError::MalformedResponse(format!("{e}: {}", preview(response))))?;

    let input = match raw.action_input {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let action = match raw.action.trim().to_ascii_lowercase().as_str() {
        "search" | "searchtool" => {
            if input.trim().is_empty() {
                return Err(AgentError::InvalidAction(
                    "search requires a non-empty query".to_string(),
                ));
            }
            Action::Search { query: input }
        }
        "post" | "slacktool" => Action::Post {
            message: input,
            channel: raw
                .channel
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        },
        "finalanswer" => Action::FinalAnswer(input),
        _ => return Err(AgentError::InvalidAction(raw.action)),
    };

    let thoughts = match raw.thoughts {
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    };

    Ok(Decision { thoughts, action })
}

/// Extract JSON object from text (handles markdown code blocks).
fn extract_json(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        if let Some(end) = text[start + 7..].find("```") {
            return text[start + 7..start + 7 + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        if let Some(end) = text[start + 3..].find("```") {
            return text[start + 3..start + 3 + end].trim();
        }
    }

    // Find first { and last }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return &text[start..=end];
        }
    }

    text
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX).collect();
        format!("{cut}...")
    }
}
