//! Domain layer for tsagent
//!
//! This crate contains the core types of the conversational time-series
//! agent. It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Action
//!
//! Model output is free text. The last `Action: name(k=literal, ...)` in it
//! is parsed by a literal-only grammar into an [`Action`]; nothing is ever
//! evaluated.
//!
//! ## Artifact
//!
//! Tools that produce tables return opaque ids ([`ArtifactRef`]). The session
//! remembers the last one so the model can write `<last_df_id>` or simply omit
//! `dataframe_id`.

pub mod action;
pub mod artifact;
pub mod core;
pub mod prompt;
pub mod session;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use action::{
    ACTION_MARKER, Action, Arguments, DATAFRAME_ID_PARAM, LAST_ARTIFACT_PLACEHOLDER, ParseError,
    Resolution, contains_placeholder, extract_action, parse_action, resolve_placeholders,
};
pub use artifact::{ArtifactRef, detect_artifact};
pub use core::error::TurnError;
pub use prompt::PromptTemplate;
pub use session::{
    entities::{History, Message, Role},
    outcome::TurnOutcome,
};
pub use tool::{
    entities::{ToolDefinition, ToolParameter, ToolSpec},
    traits::{DefaultToolValidator, ToolValidator},
    value_objects::{ToolError, ToolResult},
};
