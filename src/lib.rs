//! devforge: Multi-agent feature pipeline with an event-sourced recorder.
//!
//! This library takes a feature idea (or an existing local codebase) through
//! market research, specification, development, testing and deployment, and
//! records every agent action in the Chronicle for later analysis.

// Core modules
pub mod agents;
pub mod chronicle;
pub mod cli;
pub mod error;
pub mod pipeline;
pub mod storage;
pub mod utils;

// Re-export commonly used error types
pub use error::{ChronicleError, ConfigError, PipelineError};
