//! Turn-scoped error types

use crate::action::ParseError;
use crate::tool::ToolError;
use thiserror::Error;

/// Why a single conversation turn did not produce a tool result.
///
/// Every variant is turn-scoped: the session records it in history and stays
/// usable for the next turn.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TurnError {
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    #[error("Action parse error: {0}")]
    ActionParse(#[from] ParseError),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool execution failed: {0}")]
    ToolExecution(#[from] ToolError),

    #[error(
        "Missing artifact reference: argument '{argument}' of '{tool}' needs a dataframe id, but no dataframe has been produced yet"
    )]
    MissingArtifactReference { tool: String, argument: String },
}

impl TurnError {
    /// Stable snake_case name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            TurnError::ModelInvocation(_) => "model_invocation",
            TurnError::ActionParse(_) => "action_parse",
            TurnError::UnknownTool(_) => "unknown_tool",
            TurnError::ToolExecution(_) => "tool_execution",
            TurnError::MissingArtifactReference { .. } => "missing_artifact_reference",
        }
    }

    /// Whether the failure happened after a tool was selected
    pub fn is_dispatch_error(&self) -> bool {
        matches!(
            self,
            TurnError::UnknownTool(_)
                | TurnError::ToolExecution(_)
                | TurnError::MissingArtifactReference { .. }
        )
    }
}
