//! Command-line interface for devforge.
//!
//! Provides commands for running the full pipeline, invoking single stages
//! and inspecting run records and Chronicle sessions.

mod commands;

pub use commands::{parse_cli, run, run_with_cli};
