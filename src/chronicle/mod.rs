//! Chronicle: event-sourced record of a pipeline run.
//!
//! # Overview
//!
//! The Chronicle observes agents as they work and keeps an append-only log of
//! typed events for one session at a time:
//!
//! - **Events** ([`EventKind`]): session start/end, agent actions, handoffs,
//!   decisions, collaborations, checkpoints and issues
//! - **Recorder** ([`ChronicleRecorder`]): session lifecycle and thread-safe appends
//! - **Report** ([`Report`]): statistics, timeline, handoff chain, bottlenecks
//!   and recommendations derived from a closed log
//! - **Narrative**: a markdown rendering of the report
//! - **Store** ([`ChronicleStore`]): `{session_id}.json` and
//!   `{session_id}_narrative.md` in the output directory
//!
//! # Usage
//!
//! ```rust,ignore
//! use devforge::chronicle::{ActionMetadata, ChronicleConfig, ChronicleRecorder};
//!
//! let recorder = ChronicleRecorder::new(ChronicleConfig::default());
//! recorder.start_session("demo", "demo").await?;
//! recorder.record_agent_action("pm", "create_specification", None, None, ActionMetadata::new())?;
//! recorder.record_handoff("pm", "dev", "feature_specification", "3 user stories")?;
//! let report = recorder.end_session("success").await?;
//! assert_eq!(report.summary.total_events, 4);
//! ```

pub mod config;
pub mod log;
pub mod narrative;
pub mod recorder;
pub mod report;
pub mod store;
pub mod types;

pub use config::ChronicleConfig;
pub use log::EventLog;
pub use recorder::{ChronicleRecorder, ABORTED_STATUS};
pub use report::{AgentStatistics, Bottleneck, Report, ReportSummary, TimelineEntry};
pub use store::{ChronicleStore, PersistedSession};
pub use types::{summarize, ActionMetadata, CheckpointStatus, Event, EventKind, CHRONICLE_VERSION};
