//! Error types for devforge operations.
//!
//! Defines the error types that cross subsystem boundaries:
//! - Chronicle session lifecycle and persistence
//! - Pipeline orchestration (persistence of run records)
//! - Configuration loading and validation
//!
//! Collaborator failures are described by [`crate::agents::AgentError`] and are
//! converted into a run status by the orchestrator instead of escaping it.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors that can occur while recording a Chronicle session.
#[derive(Debug, Error)]
pub enum ChronicleError {
    /// An append or close was attempted with no open session.
    #[error("No active chronicle session")]
    NoActiveSession,

    /// The event payload breaks an event invariant.
    #[error("Invalid chronicle event: {0}")]
    InvalidEvent(String),

    /// The report or narrative could not be written.
    #[error("Failed to persist chronicle output: {0}")]
    Persistence(#[from] StorageError),
}

/// Result type for Chronicle operations.
pub type ChronicleResult<T> = Result<T, ChronicleError>;

/// Errors that escape the pipeline orchestrator.
///
/// Stage failures and quality-gate failures never appear here; they are
/// reported through the run record's status.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Chronicle error: {0}")]
    Chronicle(#[from] ChronicleError),

    #[error("Failed to persist run record: {0}")]
    Persistence(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl ChronicleError {
    /// Returns true when the error came from writing to disk.
    pub fn is_persistence(&self) -> bool {
        matches!(self, ChronicleError::Persistence(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChronicleError::NoActiveSession;
        assert_eq!(err.to_string(), "No active chronicle session");
        assert!(!err.is_persistence());

        let err = ChronicleError::from(StorageError::NotFound("session_x".to_string()));
        assert!(err.is_persistence());
        assert!(err.to_string().contains("session_x"));
    }

    #[test]
    fn test_pipeline_error_wraps_chronicle() {
        let err = PipelineError::from(ChronicleError::NoActiveSession);
        assert!(matches!(err, PipelineError::Chronicle(_)));
        assert!(err.to_string().starts_with("Chronicle error"));
    }
}
