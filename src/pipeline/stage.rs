//! Stage model for a pipeline run.
//!
//! Each stage produces exactly one typed [`StageResult`] variant, so the run
//! record's `steps` list is `[{step, result}, ...]` with a statically known
//! shape per step. Failures are classified by [`StageFailure`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agents::{
    AgentError, DeploymentSummary, DevelopmentSummary, MarketResearchSummary,
    ReverseEngineerSummary, SpecSummary, TestSummary,
};

/// The stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    ReverseEngineer,
    MarketResearch,
    Specification,
    Development,
    Testing,
    Deployment,
}

impl PipelineStage {
    /// Step name used in run records, matching the owning agent's name.
    pub fn step_name(&self) -> &'static str {
        match self {
            PipelineStage::ReverseEngineer => "reverse_engineer",
            PipelineStage::MarketResearch => "web_scraper",
            PipelineStage::Specification => "pm",
            PipelineStage::Development => "dev",
            PipelineStage::Testing => "qa",
            PipelineStage::Deployment => "deploy",
        }
    }

    /// Checkpoint stage label recorded in the Chronicle.
    pub fn checkpoint_name(&self) -> &'static str {
        match self {
            PipelineStage::ReverseEngineer => "reverse_engineering",
            PipelineStage::MarketResearch => "market_research",
            PipelineStage::Specification => "specification",
            PipelineStage::Development => "development",
            PipelineStage::Testing => "testing",
            PipelineStage::Deployment => "deployment",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.step_name())
    }
}

/// One completed stage and its summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", content = "result", rename_all = "snake_case")]
pub enum StageResult {
    ReverseEngineer(ReverseEngineerSummary),
    #[serde(rename = "web_scraper")]
    MarketResearch(MarketResearchSummary),
    #[serde(rename = "pm")]
    Specification(SpecSummary),
    #[serde(rename = "dev")]
    Development(DevelopmentSummary),
    #[serde(rename = "qa")]
    Testing(TestSummary),
    #[serde(rename = "deploy")]
    Deployment(DeploymentSummary),
}

impl StageResult {
    pub fn stage(&self) -> PipelineStage {
        match self {
            StageResult::ReverseEngineer(_) => PipelineStage::ReverseEngineer,
            StageResult::MarketResearch(_) => PipelineStage::MarketResearch,
            StageResult::Specification(_) => PipelineStage::Specification,
            StageResult::Development(_) => PipelineStage::Development,
            StageResult::Testing(_) => PipelineStage::Testing,
            StageResult::Deployment(_) => PipelineStage::Deployment,
        }
    }

    /// One-line human summary, used by the CLI run summary.
    pub fn headline(&self) -> String {
        match self {
            StageResult::ReverseEngineer(r) => format!(
                "Analyzed {} files, stack: {}",
                r.file_metrics.total_files,
                r.tech_stack_guess.as_deref().unwrap_or("unknown")
            ),
            StageResult::MarketResearch(r) => format!(
                "{} competitors, {} trends, {} pain points",
                r.competitor_count, r.trend_count, r.pain_point_count
            ),
            StageResult::Specification(r) => {
                format!("{} ({} user stories)", r.title, r.user_story_count)
            }
            StageResult::Development(r) => format!(
                "Generated {} files, stack: {} + {}",
                r.files_generated_count, r.tech_stack_used.frontend, r.tech_stack_used.backend
            ),
            StageResult::Testing(r) => format!("{:.1}% score ({})", r.overall_score, r.status),
            StageResult::Deployment(r) => format!("{} to {} on {}", r.status, r.environment, r.platform),
        }
    }
}

/// Classification of a stage that did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageFailure {
    /// The collaborator returned an error.
    Exception,
    /// The stage addressed a feature with no specification on disk.
    MissingArtifact,
    /// The collaborator did not answer within the stage timeout.
    StageTimeout,
}

impl StageFailure {
    /// Classifies an agent error.
    pub fn classify(error: &AgentError) -> Self {
        match error {
            AgentError::MissingArtifact { .. } => StageFailure::MissingArtifact,
            AgentError::Timeout { .. } => StageFailure::StageTimeout,
            _ => StageFailure::Exception,
        }
    }

    /// Issue type recorded in the Chronicle.
    pub fn issue_type(&self) -> &'static str {
        match self {
            StageFailure::Exception => "exception",
            StageFailure::MissingArtifact => "missing_artifact",
            StageFailure::StageTimeout => "stage_timeout",
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.issue_type())
    }
}
