//! Template Spec Writer - turns an idea into a stored feature specification.
//!
//! Produces three user stories (access, item management, discovery) with
//! numbered acceptance criteria, and stores the tech-stack preference for the
//! development stage.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::utils::{title_case, truncate_chars};

use super::collaborators::SpecWriter;
use super::error::{AgentError, AgentResult};
use super::feature_store::FeatureStore;
use super::types::{AcceptanceCriterion, FeatureSpec, SpecSummary, UserStory};

const MAX_TITLE_CHARS: usize = 60;

/// Story templates: narrative plus acceptance criteria. `{subject}` is replaced
/// with the feature title.
const STORY_TEMPLATES: &[(&str, &[&str])] = &[
    (
        "As a new user, I want to sign up and sign in so that my {subject} data stays private",
        &[
            "A visitor can create an account",
            "A registered user can sign in and sign out",
        ],
    ),
    (
        "As a user, I want to create and edit {subject} items so that I can manage my work",
        &[
            "An item can be created with a title",
            "An item can be edited and deleted",
            "Items persist across sessions",
        ],
    ),
    (
        "As a user, I want to browse and search {subject} items so that I can find what I need",
        &[
            "Items are listed newest first",
            "Items can be filtered by keyword",
        ],
    ),
];

/// Spec writer producing template-based specifications.
#[derive(Debug, Clone)]
pub struct TemplateSpecWriter {
    store: FeatureStore,
}

impl TemplateSpecWriter {
    pub const AGENT_NAME: &'static str = "pm";

    pub fn new(store: FeatureStore) -> Self {
        Self { store }
    }
}

fn build_stories(subject: &str) -> Vec<UserStory> {
    STORY_TEMPLATES
        .iter()
        .enumerate()
        .map(|(i, (story, criteria))| {
            let number = i + 1;
            UserStory {
                id: format!("US-{}", number),
                story: story.replace("{subject}", subject),
                acceptance_criteria: criteria
                    .iter()
                    .enumerate()
                    .map(|(j, description)| AcceptanceCriterion {
                        id: format!("AC-{}-{}", number, j + 1),
                        description: description.to_string(),
                    })
                    .collect(),
            }
        })
        .collect()
}

#[async_trait]
impl SpecWriter for TemplateSpecWriter {
    async fn create(&self, idea: &str, tech_stack: Option<&str>) -> AgentResult<SpecSummary> {
        let idea = idea.trim();
        if idea.is_empty() {
            return Err(AgentError::InvalidInput("idea cannot be empty".to_string()));
        }

        let title = truncate_chars(&title_case(idea), MAX_TITLE_CHARS);
        let now = Utc::now();
        let mut spec = FeatureSpec {
            feature_id: FeatureStore::generate_feature_id(),
            title: title.clone(),
            idea: idea.to_string(),
            status: "specified".to_string(),
            created_at: now,
            updated_at: now,
            tech_preference: tech_stack.map(str::to_string),
            user_stories: build_stories(&title.to_lowercase()),
            tech_stack: None,
            codebase_dir: None,
            generated_files: Vec::new(),
            test_results: None,
            deployments: Vec::new(),
        };

        let path = self.store.save(&mut spec).await?;
        info!(
            feature_id = %spec.feature_id,
            path = %path.display(),
            "Feature specification created"
        );

        Ok(SpecSummary {
            feature_id: spec.feature_id.clone(),
            title: spec.title.clone(),
            user_story_count: spec.user_stories.len(),
            acceptance_criteria_count: spec.acceptance_criteria_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_create_stores_spec() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = FeatureStore::new(dir.path());
        let writer = TemplateSpecWriter::new(store.clone());

        let summary = writer
            .create("recipe sharing app", Some("python"))
            .await
            .expect("create failed");

        assert_eq!(summary.title, "Recipe Sharing App");
        assert_eq!(summary.user_story_count, 3);
        assert_eq!(summary.acceptance_criteria_count, 7);

        let spec = store.load(&summary.feature_id).await.expect("load failed");
        assert_eq!(spec.tech_preference.as_deref(), Some("python"));
        assert_eq!(spec.status, "specified");
        assert_eq!(spec.user_stories[1].acceptance_criteria[2].id, "AC-2-3");
        assert!(spec.user_stories[0].story.contains("recipe sharing app"));
    }

    #[tokio::test]
    async fn test_empty_idea_rejected() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let writer = TemplateSpecWriter::new(FeatureStore::new(dir.path()));
        let result = writer.create("  ", None).await;
        assert!(matches!(result, Err(AgentError::InvalidInput(_))));
    }
}
