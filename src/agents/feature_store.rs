//! File-backed store for feature artifacts.
//!
//! Layout under the projects directory:
//!
//! ```text
//! projects/
//!   {feature_id}/
//!     feature_spec.json
//!     codebase/...
//! ```

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::storage::{JsonStore, StorageError};
use crate::utils::timestamp_id;

use super::error::{AgentError, AgentResult};
use super::types::FeatureSpec;

const SPEC_KEY: &str = "feature_spec";

/// Reads and writes feature documents by id.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    projects_dir: PathBuf,
}

impl FeatureStore {
    pub fn new(projects_dir: impl Into<PathBuf>) -> Self {
        Self {
            projects_dir: projects_dir.into(),
        }
    }

    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir
    }

    /// Generates a fresh feature id: `feat_{YYYYmmdd_HHMMSS}_{8 hex}`.
    pub fn generate_feature_id() -> String {
        timestamp_id("feat")
    }

    pub fn feature_dir(&self, feature_id: &str) -> PathBuf {
        self.projects_dir.join(feature_id)
    }

    pub fn codebase_dir(&self, feature_id: &str) -> PathBuf {
        self.feature_dir(feature_id).join("codebase")
    }

    pub fn spec_path(&self, feature_id: &str) -> PathBuf {
        self.feature_dir(feature_id).join(format!("{}.json", SPEC_KEY))
    }

    fn spec_store(&self, feature_id: &str) -> JsonStore {
        JsonStore::new(self.feature_dir(feature_id))
    }

    /// Returns true if a specification exists for `feature_id`.
    pub fn exists(&self, feature_id: &str) -> bool {
        self.spec_path(feature_id).exists()
    }

    /// Writes the feature document, stamping `updated_at`.
    pub async fn save(&self, spec: &mut FeatureSpec) -> AgentResult<PathBuf> {
        spec.updated_at = Utc::now();
        Ok(self.spec_store(&spec.feature_id).save(SPEC_KEY, spec).await?)
    }

    /// Loads the feature document.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::MissingArtifact` when no specification exists for the id.
    pub async fn load(&self, feature_id: &str) -> AgentResult<FeatureSpec> {
        if feature_id.is_empty() || feature_id.contains(['/', '\\']) || feature_id.starts_with('.') {
            return Err(AgentError::InvalidInput(format!(
                "invalid feature id '{}'",
                feature_id
            )));
        }

        match self.spec_store(feature_id).load(SPEC_KEY).await {
            Ok(spec) => Ok(spec),
            Err(StorageError::NotFound(_)) => Err(AgentError::MissingArtifact {
                feature_id: feature_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::agents::types::{AcceptanceCriterion, UserStory};
    use tempfile::TempDir;

    pub(crate) fn sample_spec(feature_id: &str) -> FeatureSpec {
        let now = Utc::now();
        FeatureSpec {
            feature_id: feature_id.to_string(),
            title: "Todo App".to_string(),
            idea: "todo app".to_string(),
            status: "specified".to_string(),
            created_at: now,
            updated_at: now,
            tech_preference: None,
            user_stories: vec![UserStory {
                id: "US-1".to_string(),
                story: "As a user, I want to add todos".to_string(),
                acceptance_criteria: vec![AcceptanceCriterion {
                    id: "AC-1-1".to_string(),
                    description: "A todo can be created".to_string(),
                }],
            }],
            tech_stack: None,
            codebase_dir: None,
            generated_files: Vec::new(),
            test_results: None,
            deployments: Vec::new(),
        }
    }

    #[test]
    fn test_generate_feature_id_format() {
        let id = FeatureStore::generate_feature_id();
        assert!(id.starts_with("feat_"));
        // feat_ + 8 date + _ + 6 time + _ + 8 hex
        assert_eq!(id.len(), 5 + 8 + 1 + 6 + 1 + 8);
        assert_ne!(id, FeatureStore::generate_feature_id());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = FeatureStore::new(dir.path());

        let mut spec = sample_spec("feat_test");
        let path = store.save(&mut spec).await.expect("save failed");
        assert_eq!(path, dir.path().join("feat_test").join("feature_spec.json"));
        assert!(store.exists("feat_test"));

        let loaded = store.load("feat_test").await.expect("load failed");
        assert_eq!(loaded.title, "Todo App");
        assert_eq!(loaded.acceptance_criteria_count(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_is_missing_artifact() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = FeatureStore::new(dir.path());

        let result = store.load("feat_nope").await;
        assert!(matches!(
            result,
            Err(AgentError::MissingArtifact { feature_id }) if feature_id == "feat_nope"
        ));
    }

    #[tokio::test]
    async fn test_load_rejects_path_like_ids() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = FeatureStore::new(dir.path());

        assert!(matches!(
            store.load("../etc").await,
            Err(AgentError::InvalidInput(_))
        ));
        assert!(matches!(store.load("").await, Err(AgentError::InvalidInput(_))));
    }
}
