//! Pipeline orchestration from feature idea to deployment.
//!
//! This module drives one feature through a fixed sequence of stages, each
//! owned by an agent, while the Chronicle records what every agent did.
//!
//! # Architecture
//!
//! - **Orchestrator**: the state machine invoking one agent per stage
//! - **Stage**: typed stage results and failure classification
//! - **Run**: the run record and its file-backed store
//! - **Config**: configuration for the orchestrator and the Chronicle
//!
//! # Pipeline Flow
//!
//! 1. **Reverse Engineer**: only when a source codebase is given
//! 2. **Market Research**: only when no source codebase is given
//! 3. **Specification**: allocates the feature id used by every later stage
//! 4. **Development**: generates the codebase
//! 5. **Testing**: scores the codebase from 0 to 100
//! 6. **Quality Gate**: a score below the threshold ends the run as `failed_qa`
//! 7. **Deployment**: deploys the feature and ends the run as `success`
//!
//! A stage error, missing artifact or timeout ends the run as `failed`. Every
//! terminal path closes the Chronicle session and writes the run record.
//!
//! # Example
//!
//! ```rust,ignore
//! use devforge::pipeline::{PipelineConfig, PipelineOrchestrator, PipelineRequest, RunStatus};
//!
//! let orchestrator = PipelineOrchestrator::with_builtin_agents(PipelineConfig::from_env()?)?;
//! let run = orchestrator
//!     .run_full_pipeline(PipelineRequest::new("todo app").with_tech_stack("python"))
//!     .await?;
//!
//! match run.status {
//!     RunStatus::Success => println!("{} deployed", run.feature_id.unwrap_or_default()),
//!     RunStatus::FailedQa => println!("score {:?} below gate", run.test_score()),
//!     _ => println!("failed: {}", run.error.unwrap_or_default()),
//! }
//! ```

pub mod config;
pub mod orchestrator;
pub mod run;
pub mod stage;

// Re-export main types for convenience
pub use config::{ConfigError, PipelineConfig};
pub use orchestrator::{AgentSet, PipelineOrchestrator, PipelineRequest, PipelineStats};
pub use run::{PipelineRun, RunStatus, RunStore};
pub use stage::{PipelineStage, StageFailure, StageResult};
