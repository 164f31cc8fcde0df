//! Session lifecycle and thread-safe event recording.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{ChronicleError, ChronicleResult};
use crate::utils::timestamp_id;

use super::config::ChronicleConfig;
use super::log::EventLog;
use super::narrative;
use super::report::Report;
use super::store::ChronicleStore;
use super::types::{ActionMetadata, CheckpointStatus, Event, EventKind, CHRONICLE_VERSION};

/// Final status written when an open session is replaced by a new one.
pub const ABORTED_STATUS: &str = "aborted";

const MIN_COLLABORATORS: usize = 2;

/// One open recording unit.
struct Session {
    id: String,
    start: Instant,
    log: EventLog,
}

impl Session {
    fn open(label: &str, trigger: &str) -> Self {
        let id = format!("{}_{}", timestamp_id("session"), label);

        let mut log = EventLog::new();
        log.append(EventKind::SessionStart {
            feature_id: label.to_string(),
            trigger: trigger.to_string(),
            chronicle_agent_version: CHRONICLE_VERSION.to_string(),
        });

        Self {
            id,
            start: Instant::now(),
            log,
        }
    }

    /// Appends the terminal `session_end` event.
    fn close(&mut self, final_status: &str) {
        let total_events = self.log.len();
        self.log.append(EventKind::SessionEnd {
            final_status: final_status.to_string(),
            total_duration_seconds: self.start.elapsed().as_secs_f64(),
            total_events,
        });
    }
}

/// Records what agents do during a pipeline run and turns it into a report.
///
/// The recorder holds at most one open session. Appends may come from any
/// thread; the session mutex is held only while a sequence number is assigned
/// and the event pushed. Closing a session removes it from the recorder under
/// the same mutex, so no append can land in a log that is being reported on.
pub struct ChronicleRecorder {
    config: ChronicleConfig,
    store: ChronicleStore,
    session: Mutex<Option<Session>>,
}

impl fmt::Debug for ChronicleRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChronicleRecorder")
            .field("output_dir", &self.store.output_dir())
            .field("active_session", &self.active_session_id())
            .finish_non_exhaustive()
    }
}

impl ChronicleRecorder {
    /// Agent name used when the recorder itself appears in a pipeline.
    pub const AGENT_NAME: &'static str = "chronicle";

    /// Creates a recorder writing into `config.output_dir`.
    pub fn new(config: ChronicleConfig) -> Self {
        let store = ChronicleStore::new(config.output_dir.clone());
        Self {
            config,
            store,
            session: Mutex::new(None),
        }
    }

    /// Creates a recorder with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ChronicleConfig::default())
    }

    pub fn config(&self) -> &ChronicleConfig {
        &self.config
    }

    /// Store used to persist closed sessions.
    pub fn store(&self) -> &ChronicleStore {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Id of the open session, if any.
    pub fn active_session_id(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.id.clone())
    }

    /// Snapshot of the open session's events.
    pub fn events(&self) -> Vec<Event> {
        self.lock()
            .as_ref()
            .map(|s| s.log.events().to_vec())
            .unwrap_or_default()
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Opens a new session and records its `session_start` event.
    ///
    /// If a session is still open it is closed with status `aborted` and its
    /// report persisted before this call returns.
    ///
    /// # Returns
    ///
    /// The new session id, `session_{YYYYmmdd_HHMMSS}_{8 hex}_{label}`.
    ///
    /// # Errors
    ///
    /// Returns `ChronicleError::Persistence` if the aborted session could not
    /// be written. The new session is open either way.
    pub async fn start_session(&self, label: &str, trigger: &str) -> ChronicleResult<String> {
        let session = Session::open(&sanitize_label(label), trigger);
        let session_id = session.id.clone();
        let previous = self.lock().replace(session);

        info!(session_id = %session_id, trigger, "Chronicle session started");

        if let Some(mut previous) = previous {
            warn!(
                session_id = %previous.id,
                events = previous.log.len(),
                "Closing unfinished chronicle session as aborted"
            );
            previous.close(ABORTED_STATUS);
            self.finish(previous).await?;
        }

        Ok(session_id)
    }

    /// Closes the open session, then synthesizes and persists its report.
    ///
    /// # Errors
    ///
    /// - `ChronicleError::NoActiveSession` if no session is open
    /// - `ChronicleError::Persistence` if the report or narrative could not be written
    pub async fn end_session(&self, final_status: &str) -> ChronicleResult<Report> {
        let session = {
            let mut guard = self.lock();
            let mut session = guard.take().ok_or(ChronicleError::NoActiveSession)?;
            session.close(final_status);
            session
        };

        self.finish(session).await
    }

    async fn finish(&self, session: Session) -> ChronicleResult<Report> {
        let report = Report::synthesize(&session.id, session.log.events(), &self.config);
        let narrative = narrative::render(&report, &self.config);
        let persisted = self.store.persist(&report, &narrative).await?;

        info!(
            session_id = %report.session_id,
            events = report.summary.total_events,
            report = %persisted.report_path.display(),
            "Chronicle session closed"
        );

        Ok(report)
    }

    // ========================================================================
    // Recording
    // ========================================================================

    fn append(&self, kind: EventKind) -> ChronicleResult<u64> {
        self.append_with(|_| kind)
    }

    /// The only critical section: assign the next sequence number and push.
    fn append_with(&self, build: impl FnOnce(&Session) -> EventKind) -> ChronicleResult<u64> {
        let (sequence, event_type) = {
            let mut guard = self.lock();
            let session = guard.as_mut().ok_or(ChronicleError::NoActiveSession)?;
            let kind = build(&*session);
            let event_type = kind.type_name();
            (session.log.append(kind), event_type)
        };

        debug!(sequence, event_type, "Chronicle event recorded");
        Ok(sequence)
    }

    /// Records an agent action. Input and output are stored as summaries only.
    pub fn record_agent_action(
        &self,
        agent: &str,
        action: &str,
        input: Option<&Value>,
        output: Option<&Value>,
        metadata: ActionMetadata,
    ) -> ChronicleResult<u64> {
        let max_chars = self.config.summary_max_chars;
        let max_keys = self.config.summary_max_keys;

        self.append(EventKind::AgentAction {
            agent: agent.to_string(),
            action: action.to_string(),
            input_summary: super::types::summarize(input, max_chars, max_keys),
            output_summary: super::types::summarize(output, max_chars, max_keys),
            metadata,
        })
    }

    /// Records an artifact passing from one agent to another.
    pub fn record_handoff(
        &self,
        from_agent: &str,
        to_agent: &str,
        artifact: &str,
        artifact_summary: &str,
    ) -> ChronicleResult<u64> {
        self.append(EventKind::Handoff {
            from_agent: from_agent.to_string(),
            to_agent: to_agent.to_string(),
            artifact: artifact.to_string(),
            artifact_summary: artifact_summary.to_string(),
        })
    }

    /// Records a decision and its rationale.
    pub fn record_decision(
        &self,
        agent: &str,
        decision: &str,
        rationale: &str,
        alternatives: &[&str],
    ) -> ChronicleResult<u64> {
        self.append(EventKind::Decision {
            agent: agent.to_string(),
            decision: decision.to_string(),
            rationale: rationale.to_string(),
            alternatives: alternatives.iter().map(|a| a.to_string()).collect(),
        })
    }

    /// Records a joint activity of several agents.
    ///
    /// # Errors
    ///
    /// Returns `ChronicleError::InvalidEvent` when fewer than two agents are named.
    pub fn record_collaboration(
        &self,
        agents: &[&str],
        activity: &str,
        result: &str,
    ) -> ChronicleResult<u64> {
        if agents.len() < MIN_COLLABORATORS {
            return Err(ChronicleError::InvalidEvent(format!(
                "collaboration needs at least {} agents, got {}",
                MIN_COLLABORATORS,
                agents.len()
            )));
        }
        self.append(EventKind::Collaboration {
            agents: agents.iter().map(|a| a.to_string()).collect(),
            activity: activity.to_string(),
            result: result.to_string(),
        })
    }

    /// Records a stage checkpoint stamped with the time since session start.
    pub fn record_checkpoint(
        &self,
        stage: &str,
        status: CheckpointStatus,
        metrics: Option<Map<String, Value>>,
    ) -> ChronicleResult<u64> {
        let stage = stage.to_string();
        let metrics = metrics.unwrap_or_default();

        self.append_with(move |session| EventKind::Checkpoint {
            stage,
            status,
            metrics,
            elapsed_seconds: session.start.elapsed().as_secs_f64(),
        })
    }

    /// Records an issue. It counts as resolved when a resolution is given.
    pub fn record_issue(
        &self,
        agent: &str,
        issue_type: &str,
        description: &str,
        resolution: Option<&str>,
    ) -> ChronicleResult<u64> {
        self.append(EventKind::Issue {
            agent: agent.to_string(),
            issue_type: issue_type.to_string(),
            description: description.to_string(),
            resolution: resolution.map(str::to_string),
            resolved: resolution.is_some(),
        })
    }
}

/// Makes a caller-supplied label safe to embed in a file name.
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}
