//! Tool domain module
//!
//! Describes the capabilities the model can invoke over tabular data.
//! Every capability is declared by a [`ToolDefinition`] (name, parameters,
//! return description), collected in an immutable [`ToolSpec`], invoked with
//! an [`Action`](crate::action::Action) and answers with a [`ToolResult`].
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolSpec     │───▶│ Action       │───▶│ ToolResult   │
//! │ (registry)   │    │ (invocation) │    │ (output)     │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! # Architecture
//!
//! - **Domain** (this module): definitions and validation, no I/O
//! - **Application** (`ToolExecutorPort`, `ToolDispatcher`): dispatch contract
//! - **Infrastructure** (`DataToolExecutor`): the concrete data tools

pub mod entities;
pub mod traits;
pub mod value_objects;

pub use entities::{ToolDefinition, ToolParameter, ToolSpec};
pub use traits::{DefaultToolValidator, ToolValidator};
pub use value_objects::{ToolError, ToolResult};
