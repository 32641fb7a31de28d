//! Machine-readable transcript of a chat session.
//!
//! The session emits one event per step of a turn:
//!
//! | `event_type` | Payload fields |
//! |--------------|----------------|
//! | `user_message` | `turn`, `content` |
//! | `model_response` | `turn`, `backend`, `text`, `finish_reason`, `metadata` |
//! | `tool_call` | `turn`, `tool`, `arguments` (after placeholder resolution), `source` |
//! | `tool_result` | `turn`, `tool`, `output` |
//! | `turn_error` | `turn`, `kind`, `dispatch`, `message` |
//!
//! `tracing` carries the diagnostics; this port carries the transcript.

use serde_json::Value;

/// One transcript entry
pub struct ConversationEvent {
    /// One of the event types in the table above
    pub event_type: &'static str,
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Sink for transcript events.
///
/// Called inline from the turn, so `log` must not block for long and cannot
/// fail: a sink that loses its file keeps the session running.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Used when no transcript file is configured
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
