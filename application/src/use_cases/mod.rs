//! Use cases (application services)
//!
//! - [`conversation::ConversationSession`]: the turn state machine
//! - [`dispatch::ToolDispatcher`]: runs a resolved action against a tool

pub mod conversation;
pub mod dispatch;
