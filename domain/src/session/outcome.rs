//! Turn outcome: the observable record of one conversation turn

use crate::action::Action;
use crate::core::error::TurnError;

/// Result of a single turn.
///
/// At most one of `tool_result` and `error` is set. The outcome itself is not
/// persisted; only [`assistant_message`](Self::assistant_message) enters history.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Raw model text
    pub model_text: String,
    /// The action extracted from the model text, after placeholder resolution
    pub action: Option<Action>,
    /// Successful tool output
    pub tool_result: Option<String>,
    /// Why the turn failed
    pub error: Option<TurnError>,
}

impl TurnOutcome {
    /// Model replied without an action
    pub fn reply(model_text: impl Into<String>) -> Self {
        Self {
            model_text: model_text.into(),
            action: None,
            tool_result: None,
            error: None,
        }
    }

    pub fn success(model_text: impl Into<String>, action: Action, result: impl Into<String>) -> Self {
        Self {
            model_text: model_text.into(),
            action: Some(action),
            tool_result: Some(result.into()),
            error: None,
        }
    }

    pub fn failure(model_text: impl Into<String>, action: Option<Action>, error: TurnError) -> Self {
        Self {
            model_text: model_text.into(),
            action,
            tool_result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Content of the single assistant message this turn appends to history
    pub fn assistant_message(&self) -> String {
        let section = match (&self.tool_result, &self.error) {
            (_, Some(error)) => format!("Error: {}", error),
            (Some(result), None) => format!("Tool Result: {}", result),
            (None, None) => return self.model_text.clone(),
        };
        // A failed model call has no text to prefix
        if self.model_text.is_empty() {
            section
        } else {
            format!("{}\n\n{}", self.model_text, section)
        }
    }
}
