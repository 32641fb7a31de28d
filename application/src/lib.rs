//! Application layer for tsagent
//!
//! This crate contains the conversation use case and port definitions.
//! It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    model_backend::{BackendError, GenerationParams, ModelBackend, ModelResponse},
    progress::{NoTurnProgress, TurnProgressNotifier},
    tool_executor::ToolExecutorPort,
};
pub use use_cases::{conversation::ConversationSession, dispatch::ToolDispatcher};
