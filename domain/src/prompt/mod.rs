//! Prompt domain
//!
//! The system preamble injected at the start of every conversation.

mod template;

pub use template::PromptTemplate;
