//! Shared utility functions for devforge.
//!
//! This module provides small text helpers used by the built-in agents and
//! the pipeline when deriving titles, labels and identifiers.

pub mod text;

pub use text::{slug_label, timestamp_id, title_case, truncate_chars};
