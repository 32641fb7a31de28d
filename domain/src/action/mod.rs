//! Action domain: from model text to a dispatchable call.
//!
//! ```text
//! model text ──extract_action()──▶ Action ──resolve_placeholders()──▶ Action ──▶ dispatch
//! ```
//!
//! - [`parser`]: literal-only call grammar, last `Action:` marker wins
//! - [`placeholder`]: artifact sentinel substitution, one pass per turn
//! - [`entities::Action`]: name plus ordered literal arguments

pub mod entities;
pub mod parser;
pub mod placeholder;

pub use entities::{Action, Arguments, literal_kind};
pub use parser::{ACTION_MARKER, ParseError, extract_action, parse_action};
pub use placeholder::{
    DATAFRAME_ID_PARAM, LAST_ARTIFACT_PLACEHOLDER, Resolution, contains_placeholder,
    resolve_placeholders,
};
