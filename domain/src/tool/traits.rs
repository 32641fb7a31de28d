//! Tool domain traits
//!
//! Pure validation of an [`Action`] against a [`ToolDefinition`]. The async
//! `ToolExecutorPort` lives in the application layer.

use super::entities::ToolDefinition;
use crate::action::Action;

/// Validator for actions
pub trait ToolValidator: Send + Sync {
    /// Validate an action against its tool definition
    fn validate(&self, action: &Action, definition: &ToolDefinition) -> Result<(), String>;
}

/// Checks required parameters are present and no undeclared ones are passed
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(&self, action: &Action, definition: &ToolDefinition) -> Result<(), String> {
        for param in &definition.parameters {
            if param.required && !action.arguments.contains_key(&param.name) {
                return Err(format!(
                    "Missing required parameter '{}' for tool '{}'",
                    param.name, definition.name
                ));
            }
        }

        for arg_name in action.arguments.keys() {
            if !definition.has_parameter(arg_name) {
                return Err(format!(
                    "Unknown parameter '{}' for tool '{}'",
                    arg_name, definition.name
                ));
            }
        }

        Ok(())
    }
}
