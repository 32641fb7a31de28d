//! Tool dispatch.
//!
//! Maps an [`Action`] to the capability registered under its name and runs
//! it. The dispatcher is the only place that turns capability failures into
//! [`TurnError`]s; it never retries.

use crate::ports::tool_executor::ToolExecutorPort;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use tsagent_domain::{
    Action, DATAFRAME_ID_PARAM, DefaultToolValidator, ToolError, ToolValidator, TurnError,
    contains_placeholder,
};

/// Dispatches resolved actions to a [`ToolExecutorPort`]
pub struct ToolDispatcher {
    executor: Arc<dyn ToolExecutorPort>,
    validator: DefaultToolValidator,
}

impl ToolDispatcher {
    pub fn new(executor: Arc<dyn ToolExecutorPort>) -> Self {
        Self {
            executor,
            validator: DefaultToolValidator,
        }
    }

    pub fn executor(&self) -> &Arc<dyn ToolExecutorPort> {
        &self.executor
    }

    /// Run `action` and return the capability's textual result.
    ///
    /// Checks, in order:
    /// 1. the tool exists (arguments are not looked at otherwise);
    /// 2. no argument still holds the artifact placeholder, and a declared
    ///    required `dataframe_id` is present;
    /// 3. the arguments match the tool signature.
    pub async fn dispatch(&self, action: &Action) -> Result<String, TurnError> {
        let Some(definition) = self.executor.get_tool(&action.name) else {
            warn!(tool = %action.name, "Unknown tool requested");
            return Err(TurnError::UnknownTool(action.name.clone()));
        };

        if let Some((argument, _)) = action
            .arguments
            .iter()
            .find(|(_, value)| contains_placeholder(value))
        {
            return Err(TurnError::MissingArtifactReference {
                tool: action.name.clone(),
                argument: argument.clone(),
            });
        }

        let needs_id = definition
            .parameter(DATAFRAME_ID_PARAM)
            .is_some_and(|p| p.required);
        if needs_id && !action.arguments.contains_key(DATAFRAME_ID_PARAM) {
            return Err(TurnError::MissingArtifactReference {
                tool: action.name.clone(),
                argument: DATAFRAME_ID_PARAM.to_string(),
            });
        }

        self.validator
            .validate(action, definition)
            .map_err(|message| TurnError::ToolExecution(ToolError::invalid_argument(message)))?;

        debug!(tool = %action.name, args = action.arguments.len(), "Dispatching tool");
        let started = Instant::now();
        let result = self.executor.execute(action).await;
        let elapsed = started.elapsed().as_millis();

        match result.into_result() {
            Ok(output) => {
                debug!(tool = %action.name, elapsed_ms = elapsed, "Tool succeeded");
                Ok(output)
            }
            Err(error) => {
                warn!(tool = %action.name, elapsed_ms = elapsed, code = %error.code, "Tool failed: {}", error.message);
                Err(TurnError::ToolExecution(error))
            }
        }
    }
}
