//! Pipeline run records and their file-backed store.
//!
//! A run record is created when a run starts and written exactly once, when
//! the run reaches a terminal status:
//!
//! ```text
//! data/
//!   pipeline_20250101_120000_3f9a1c2e.json
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chronicle::Report;
use crate::storage::{JsonStore, StorageResult};
use crate::utils::timestamp_id;

use super::stage::{StageFailure, StageResult};

/// Status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The run has not reached a terminal state yet.
    Running,
    /// Every stage completed and the feature was deployed.
    Success,
    /// The test score fell below the quality gate.
    FailedQa,
    /// A stage failed.
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Success => write!(f, "success"),
            RunStatus::FailedQa => write!(f, "failed_qa"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Record of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub pipeline_id: String,
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StageResult>,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<StageFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chronicle: Option<Report>,
}

impl PipelineRun {
    /// Starts a new run record with a fresh `pipeline_{YYYYmmdd_HHMMSS}_{8 hex}` id.
    pub fn start() -> Self {
        Self {
            pipeline_id: timestamp_id("pipeline"),
            started_at: Utc::now(),
            steps: Vec::new(),
            status: RunStatus::Running,
            feature_id: None,
            completed_at: None,
            error: None,
            failure: None,
            chronicle: None,
        }
    }

    /// Appends a completed stage.
    pub fn push(&mut self, result: StageResult) {
        self.steps.push(result);
    }

    /// Marks the run as successful.
    pub(crate) fn succeeded(&mut self) {
        self.status = RunStatus::Success;
        self.completed_at = Some(Utc::now());
    }

    /// Marks the run as halted by the quality gate.
    pub(crate) fn failed_qa(&mut self) {
        self.status = RunStatus::FailedQa;
    }

    /// Marks the run as failed.
    pub(crate) fn failed(&mut self, failure: StageFailure, error: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.failure = Some(failure);
        self.error = Some(error.into());
    }

    /// Returns the test score of the run, if the testing stage completed.
    pub fn test_score(&self) -> Option<f64> {
        self.steps.iter().find_map(|step| match step {
            StageResult::Testing(summary) => Some(summary.overall_score),
            _ => None,
        })
    }
}

/// Reads and writes run records under the data directory.
#[derive(Debug, Clone)]
pub struct RunStore {
    store: JsonStore,
}

impl RunStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(data_dir),
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.store.base_path()
    }

    /// Path the record of `pipeline_id` is written to.
    pub fn record_path(&self, pipeline_id: &str) -> PathBuf {
        self.store.document_path(pipeline_id)
    }

    pub async fn save(&self, run: &PipelineRun) -> StorageResult<PathBuf> {
        self.store.save(&run.pipeline_id, run).await
    }

    pub async fn load(&self, pipeline_id: &str) -> StorageResult<PipelineRun> {
        self.store.load(pipeline_id).await
    }

    /// Lists stored run ids, oldest first.
    pub async fn list(&self) -> StorageResult<Vec<String>> {
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|id| id.starts_with("pipeline_"))
            .collect())
    }
}
