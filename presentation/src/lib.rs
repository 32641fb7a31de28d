//! Presentation layer for tsagent
//!
//! This crate contains CLI definitions, the console formatter,
//! progress reporters, and the interactive chat REPL.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::ChatRepl;
pub use cli::commands::{ChatArgs, Cli, Command, LlmChoice};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
