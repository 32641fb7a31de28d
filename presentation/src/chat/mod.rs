//! Interactive chat module
//!
//! Provides a line-editor based interface around a conversation session.

mod repl;

pub use repl::ChatRepl;
