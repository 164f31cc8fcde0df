//! Event types recorded by the Chronicle.
//!
//! Every event carries a 1-based sequence number and a UTC timestamp assigned
//! at append time, plus a kind-specific payload. On disk an event is a flat
//! JSON object whose `type` field names the kind:
//!
//! ```json
//! {"sequence_number": 3, "timestamp": "...", "type": "handoff",
//!  "from_agent": "pm", "to_agent": "dev", "artifact": "feature_specification",
//!  "artifact_summary": "3 user stories, API spec, DB schema"}
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::truncate_chars;

/// Version string written into every `session_start` event.
pub const CHRONICLE_VERSION: &str = "1.0";

/// Outcome reported by a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    Success,
    Warning,
    Failure,
}

impl fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointStatus::Success => write!(f, "success"),
            CheckpointStatus::Warning => write!(f, "warning"),
            CheckpointStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Optional metadata attached to an agent action.
///
/// `duration_ms` feeds per-agent statistics and bottleneck detection; any
/// other keys are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActionMetadata {
    /// Creates empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the measured duration.
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Adds an extra key.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Payload of a recorded event, one variant per event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    SessionStart {
        feature_id: String,
        trigger: String,
        chronicle_agent_version: String,
    },
    AgentAction {
        agent: String,
        action: String,
        input_summary: String,
        output_summary: String,
        #[serde(default)]
        metadata: ActionMetadata,
    },
    Handoff {
        from_agent: String,
        to_agent: String,
        artifact: String,
        artifact_summary: String,
    },
    Decision {
        agent: String,
        decision: String,
        rationale: String,
        #[serde(default)]
        alternatives: Vec<String>,
    },
    Collaboration {
        agents: Vec<String>,
        activity: String,
        result: String,
    },
    Checkpoint {
        stage: String,
        status: CheckpointStatus,
        #[serde(default)]
        metrics: Map<String, Value>,
        elapsed_seconds: f64,
    },
    Issue {
        agent: String,
        issue_type: String,
        description: String,
        resolution: Option<String>,
        resolved: bool,
    },
    SessionEnd {
        final_status: String,
        total_duration_seconds: f64,
        total_events: usize,
    },
}

impl EventKind {
    /// Returns the wire name of this event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::SessionStart { .. } => "session_start",
            EventKind::AgentAction { .. } => "agent_action",
            EventKind::Handoff { .. } => "handoff",
            EventKind::Decision { .. } => "decision",
            EventKind::Collaboration { .. } => "collaboration",
            EventKind::Checkpoint { .. } => "checkpoint",
            EventKind::Issue { .. } => "issue",
            EventKind::SessionEnd { .. } => "session_end",
        }
    }

    /// Renders the one-line timeline description of this event.
    pub fn describe(&self) -> String {
        match self {
            EventKind::SessionStart { feature_id, .. } => {
                format!("Session started: {}", feature_id)
            }
            EventKind::AgentAction { agent, action, .. } => {
                format!("{} performed: {}", agent, action)
            }
            EventKind::Handoff {
                from_agent,
                to_agent,
                artifact,
                ..
            } => format!("{} passed {} to {}", from_agent, artifact, to_agent),
            EventKind::Decision {
                agent, decision, ..
            } => format!("{} decided: {}", agent, decision),
            EventKind::Collaboration {
                agents, activity, ..
            } => format!("{} collaborated on: {}", agents.join(" + "), activity),
            EventKind::Checkpoint { stage, status, .. } => {
                format!("Checkpoint: {} - {}", stage, status)
            }
            EventKind::Issue {
                agent,
                issue_type,
                resolved,
                ..
            } => format!(
                "Issue [{}]: {} ({})",
                agent,
                issue_type,
                if *resolved { "RESOLVED" } else { "UNRESOLVED" }
            ),
            EventKind::SessionEnd { final_status, .. } => {
                format!("Session ended: {}", final_status)
            }
        }
    }
}

/// One immutable entry of a session's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub sequence_number: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Summarizes an action input or output so the log stays bounded.
///
/// - absent values become `"None"`
/// - strings are cut to `max_chars` with a trailing `"..."`
/// - objects list at most `max_keys` key names, in insertion order
/// - arrays report their length
/// - anything else is rendered and capped to `max_chars`
pub fn summarize(value: Option<&Value>, max_chars: usize, max_keys: usize) -> String {
    match value {
        None | Some(Value::Null) => "None".to_string(),
        Some(Value::String(s)) => {
            if s.chars().count() > max_chars {
                format!("{}...", truncate_chars(s, max_chars))
            } else {
                s.clone()
            }
        }
        Some(Value::Object(map)) => {
            let keys: Vec<&str> = map.keys().take(max_keys).map(String::as_str).collect();
            format!("Dict with keys: {}", keys.join(", "))
        }
        Some(Value::Array(items)) => format!("List with {} items", items.len()),
        Some(other) => truncate_chars(&other.to_string(), max_chars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summarize_none_and_null() {
        assert_eq!(summarize(None, 200, 5), "None");
        assert_eq!(summarize(Some(&Value::Null), 200, 5), "None");
    }

    #[test]
    fn test_summarize_long_string() {
        let long = "x".repeat(250);
        let summary = summarize(Some(&Value::String(long)), 200, 5);
        assert_eq!(summary.len(), 203);
        assert!(summary.ends_with("..."));

        let short = summarize(Some(&json!("build a todo app")), 200, 5);
        assert_eq!(short, "build a todo app");
    }

    #[test]
    fn test_summarize_string_respects_char_boundaries() {
        let text = "é".repeat(10);
        let summary = summarize(Some(&Value::String(text)), 4, 5);
        assert_eq!(summary, "éééé...");
    }

    #[test]
    fn test_summarize_object_caps_keys() {
        let value = json!({"a": 1, "b": 2, "c": 3, "d": 4, "e": 5, "f": 6});
        assert_eq!(
            summarize(Some(&value), 200, 5),
            "Dict with keys: a, b, c, d, e"
        );
    }

    #[test]
    fn test_summarize_object_keeps_insertion_order() {
        let value = json!({"title": "Todo", "feature_id": "feat_1", "acceptance": 3});
        assert_eq!(
            summarize(Some(&value), 200, 5),
            "Dict with keys: title, feature_id, acceptance"
        );
    }

    #[test]
    fn test_summarize_array_and_scalar() {
        assert_eq!(
            summarize(Some(&json!([1, 2, 3])), 200, 5),
            "List with 3 items"
        );
        assert_eq!(summarize(Some(&json!(42)), 200, 5), "42");
        assert_eq!(summarize(Some(&json!(true)), 200, 5), "true");
    }

    #[test]
    fn test_event_serializes_flat_with_type_tag() {
        let event = Event {
            sequence_number: 2,
            timestamp: Utc::now(),
            kind: EventKind::Handoff {
                from_agent: "pm".to_string(),
                to_agent: "dev".to_string(),
                artifact: "feature_specification".to_string(),
                artifact_summary: "3 user stories".to_string(),
            },
        };

        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(value["type"], "handoff");
        assert_eq!(value["sequence_number"], 2);
        assert_eq!(value["from_agent"], "pm");

        let back: Event = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, event);
    }

    #[test]
    fn test_action_metadata_flattens_extra_fields() {
        let metadata = ActionMetadata::new()
            .with_duration_ms(1500)
            .with_field("score", 87.5);
        let value = serde_json::to_value(&metadata).expect("serialize");
        assert_eq!(value, json!({"duration_ms": 1500, "score": 87.5}));

        let empty = serde_json::to_value(ActionMetadata::new()).expect("serialize");
        assert_eq!(empty, json!({}));
    }

    #[test]
    fn test_describe_templates() {
        let issue = EventKind::Issue {
            agent: "qa".to_string(),
            issue_type: "low_test_score".to_string(),
            description: "QA score 40% below threshold".to_string(),
            resolution: None,
            resolved: false,
        };
        assert_eq!(issue.describe(), "Issue [qa]: low_test_score (UNRESOLVED)");
        assert_eq!(issue.type_name(), "issue");

        let collab = EventKind::Collaboration {
            agents: vec!["pm".to_string(), "dev".to_string()],
            activity: "API design".to_string(),
            result: "agreed".to_string(),
        };
        assert_eq!(collab.describe(), "pm + dev collaborated on: API design");

        let checkpoint = EventKind::Checkpoint {
            stage: "testing".to_string(),
            status: CheckpointStatus::Warning,
            metrics: Map::new(),
            elapsed_seconds: 1.0,
        };
        assert_eq!(checkpoint.describe(), "Checkpoint: testing - warning");
    }
}
