//! Progress notification port
//!
//! Defines the interface for reporting progress during a conversation turn.

use tsagent_domain::Action;

/// Callback for progress updates during a turn
///
/// Implementations live in the presentation layer (spinner, plain text, ...).
pub trait TurnProgressNotifier: Send + Sync {
    /// Called before the model backend is invoked
    fn on_model_start(&self, backend: &str);

    /// Called when the model backend returns
    fn on_model_end(&self, success: bool);

    /// Called before a resolved action is dispatched
    fn on_tool_start(&self, _action: &Action) {}

    /// Called when dispatch finishes
    fn on_tool_end(&self, _tool: &str, _success: bool) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoTurnProgress;

impl TurnProgressNotifier for NoTurnProgress {
    fn on_model_start(&self, _backend: &str) {}
    fn on_model_end(&self, _success: bool) {}
}
