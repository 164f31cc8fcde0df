//! Typed results exchanged between agents and the orchestrator.
//!
//! Each collaborator returns a small summary rather than its full artifact.
//! The feature artifact itself ([`FeatureSpec`]) lives on disk and is shared
//! by id through the [`super::FeatureStore`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Stage summaries
// ============================================================================

/// Line and file counts for an analyzed codebase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMetrics {
    pub total_files: usize,
    pub lines_of_code: usize,
    pub blank_lines: usize,
    pub comment_lines: usize,
    /// Code files per extension, e.g. `".rs" -> 12`.
    pub file_types: BTreeMap<String, usize>,
}

/// Product-style description rebuilt from an existing codebase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructedSpec {
    pub title: String,
    pub description: String,
    pub purpose: String,
}

/// Result of the reverse-engineering stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseEngineerSummary {
    pub analysis_id: String,
    /// Primary language, when one could be guessed.
    pub tech_stack_guess: Option<String>,
    pub reconstructed_spec: ReconstructedSpec,
    pub file_metrics: FileMetrics,
}

/// Result of the market-research stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketResearchSummary {
    pub research_id: String,
    pub competitor_count: usize,
    pub trend_count: usize,
    pub pain_point_count: usize,
    pub insights: Vec<String>,
}

/// Result of the specification stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecSummary {
    pub feature_id: String,
    pub title: String,
    pub user_story_count: usize,
    pub acceptance_criteria_count: usize,
}

/// Technologies chosen for a generated codebase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStack {
    pub frontend: String,
    pub backend: String,
    pub database: String,
}

impl Default for TechStack {
    fn default() -> Self {
        Self {
            frontend: "React".to_string(),
            backend: "Node.js".to_string(),
            database: "PostgreSQL".to_string(),
        }
    }
}

/// Result of the development stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentSummary {
    pub feature_id: String,
    pub tech_stack_used: TechStack,
    pub files_generated_count: usize,
}

/// Verdict derived from a test score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    PassedWithWarnings,
    NeedsImprovement,
    Failed,
}

impl TestStatus {
    /// Maps a 0-100 score onto a verdict.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            TestStatus::Passed
        } else if score >= 70.0 {
            TestStatus::PassedWithWarnings
        } else if score >= 50.0 {
            TestStatus::NeedsImprovement
        } else {
            TestStatus::Failed
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "passed"),
            TestStatus::PassedWithWarnings => write!(f, "passed_with_warnings"),
            TestStatus::NeedsImprovement => write!(f, "needs_improvement"),
            TestStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One static check performed by the testing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub category: String,
    pub name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub details: String,
}

/// Detailed testing output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub checks: Vec<CheckResult>,
    /// Percentage of passed checks per category.
    pub category_scores: BTreeMap<String, f64>,
    pub recommendations: Vec<String>,
}

/// Result of the testing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub feature_id: String,
    pub overall_score: f64,
    pub status: TestStatus,
    pub full_report: TestReport,
}

/// Result of the deployment stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub feature_id: String,
    pub deployment_id: String,
    pub environment: String,
    pub platform: String,
    pub status: String,
    pub urls: BTreeMap<String, String>,
}

// ============================================================================
// Feature artifact
// ============================================================================

/// A user story with its acceptance criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStory {
    /// Story id, e.g. `US-1`.
    pub id: String,
    pub story: String,
    /// Criteria ids are `AC-{story}-{n}`, e.g. `AC-1-2`.
    pub acceptance_criteria: Vec<AcceptanceCriterion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    pub id: String,
    pub description: String,
}

/// The feature document shared by every stage, stored as
/// `projects/{feature_id}/feature_spec.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub feature_id: String,
    pub title: String,
    pub idea: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tech_preference: Option<String>,
    pub user_stories: Vec<UserStory>,
    #[serde(default)]
    pub tech_stack: Option<TechStack>,
    #[serde(default)]
    pub codebase_dir: Option<PathBuf>,
    #[serde(default)]
    pub generated_files: Vec<String>,
    #[serde(default)]
    pub test_results: Option<TestSummary>,
    #[serde(default)]
    pub deployments: Vec<DeploymentSummary>,
}

impl FeatureSpec {
    /// Total number of acceptance criteria across all stories.
    pub fn acceptance_criteria_count(&self) -> usize {
        self.user_stories
            .iter()
            .map(|s| s.acceptance_criteria.len())
            .sum()
    }
}
