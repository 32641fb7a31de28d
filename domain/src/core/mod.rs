//! Core domain concepts shared across all subdomains.
//!
//! - [`error::TurnError`]: turn-scoped failures

pub mod error;
