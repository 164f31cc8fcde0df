//! Error types for pipeline agents.
//!
//! Every collaborator call returns an [`AgentResult`]. The orchestrator maps
//! these errors onto a run status instead of letting them escape a run.

use thiserror::Error;

/// Errors that can occur during agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A stage addressed a feature id that has no specification on disk.
    #[error("Feature {feature_id} not found: no specification on disk")]
    MissingArtifact { feature_id: String },

    /// The agent could not complete its stage.
    #[error("Pipeline stage '{stage}' failed: {reason}")]
    StageFailed { stage: String, reason: String },

    /// The agent was given input it cannot handle.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The stage did not finish within its time budget.
    #[error("Agent operation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Template rendering failed while generating files.
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// A pattern used for static checks failed to compile.
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Reading or writing a stored artifact failed.
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

impl AgentError {
    /// Creates a stage failure.
    pub fn stage_failed(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        AgentError::StageFailed {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AgentError::MissingArtifact {
            feature_id: "feat_1".to_string(),
        };
        assert!(err.to_string().contains("feat_1"));

        let err = AgentError::stage_failed("dev", "disk full");
        assert_eq!(err.to_string(), "Pipeline stage 'dev' failed: disk full");

        let err = AgentError::Timeout { seconds: 30 };
        assert!(err.to_string().contains("30 seconds"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AgentError = io.into();
        assert!(matches!(err, AgentError::Io(_)));
    }
}
