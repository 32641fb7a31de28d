//! Conversation session domain.
//!
//! - [`entities::Message`]: a single message within a conversation
//! - [`entities::History`]: append-only message log
//! - [`outcome::TurnOutcome`]: what one turn produced

pub mod entities;
pub mod outcome;
