//! Report synthesis over a closed session's event log.
//!
//! A [`Report`] is computed once from the frozen log and never mutated. The
//! synthesis is a single pass over the events:
//!
//! 1. bucket events by kind, grouping agent actions per agent
//! 2. derive per-agent action counts and durations
//! 3. render every event to a timeline line
//! 4. render the handoff chain diagram
//! 5. flag long-running actions and unresolved issues as bottlenecks
//! 6. apply the recommendation heuristics

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::ChronicleConfig;
use super::types::{Event, EventKind};

/// Number of action names sampled into each agent's statistics.
const SAMPLE_ACTIONS: usize = 5;

/// Handoff count above which parallelization is suggested.
const PARALLELIZE_HANDOFFS: usize = 5;

/// Repetitions of one (agent, action) pair above which caching is suggested.
const REPEATED_ACTION_LIMIT: usize = 3;

/// Recommendations appended to every report.
const STANDARD_RECOMMENDATIONS: [&str; 3] = [
    "All agent interactions were logged successfully",
    "Review the handoff chain for potential optimizations",
    "Consider adding more granular checkpoints for better visibility",
];

/// Aggregate counts for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_events: usize,
    pub total_agents_involved: usize,
    pub total_handoffs: usize,
    pub total_decisions: usize,
    pub total_issues: usize,
    pub total_collaborations: usize,
    pub duration_seconds: f64,
}

/// Per-agent action statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStatistics {
    pub actions_count: usize,
    pub total_duration_ms: u64,
    /// Mean over all actions, counting a missing duration as zero.
    pub avg_duration_ms: f64,
    /// First few action names in recording order.
    pub actions: Vec<String>,
}

/// One human-readable timeline line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub time: DateTime<Utc>,
    pub sequence: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub description: String,
}

/// A detected slowdown or blocker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Bottleneck {
    LongExecution {
        agent: String,
        action: String,
        duration_ms: u64,
        recommendation: String,
    },
    UnresolvedIssues {
        count: usize,
        issues: Vec<String>,
        recommendation: String,
    },
}

/// Derived, read-only analysis of one closed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub session_id: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub agent_statistics: BTreeMap<String, AgentStatistics>,
    pub timeline: Vec<TimelineEntry>,
    pub handoff_chain: String,
    /// Agents in the order artifacts travelled between them.
    #[serde(default)]
    pub handoff_path: Vec<String>,
    pub decision_log: Vec<Event>,
    pub issues_encountered: Vec<Event>,
    pub collaboration_patterns: Vec<Event>,
    pub bottlenecks: Vec<Bottleneck>,
    pub recommendations: Vec<String>,
}

impl Report {
    /// Synthesizes a report from a closed session's events.
    ///
    /// The session duration is taken from the `session_end` event when one is
    /// present and is zero otherwise.
    pub fn synthesize(session_id: &str, events: &[Event], config: &ChronicleConfig) -> Self {
        let mut agent_statistics: BTreeMap<String, AgentStatistics> = BTreeMap::new();
        let mut action_counts: BTreeMap<(String, String), usize> = BTreeMap::new();
        let mut timeline = Vec::with_capacity(events.len());
        let mut handoffs = Vec::new();
        let mut decision_log = Vec::new();
        let mut issues_encountered = Vec::new();
        let mut collaboration_patterns = Vec::new();
        let mut bottlenecks = Vec::new();
        let mut unresolved = Vec::new();
        let mut duration_seconds = 0.0;

        for event in events {
            timeline.push(TimelineEntry {
                time: event.timestamp,
                sequence: event.sequence_number,
                event_type: event.kind.type_name().to_string(),
                description: event.kind.describe(),
            });

            match &event.kind {
                EventKind::AgentAction {
                    agent,
                    action,
                    metadata,
                    ..
                } => {
                    let duration_ms = metadata.duration_ms.unwrap_or(0);
                    let stats = agent_statistics.entry(agent.clone()).or_default();
                    stats.actions_count += 1;
                    stats.total_duration_ms += duration_ms;
                    if stats.actions.len() < SAMPLE_ACTIONS {
                        stats.actions.push(action.clone());
                    }

                    *action_counts
                        .entry((agent.clone(), action.clone()))
                        .or_insert(0) += 1;

                    if duration_ms > config.bottleneck_threshold_ms {
                        bottlenecks.push(Bottleneck::LongExecution {
                            agent: agent.clone(),
                            action: action.clone(),
                            duration_ms,
                            recommendation: "Consider optimizing or parallelizing this step"
                                .to_string(),
                        });
                    }
                }
                EventKind::Handoff {
                    from_agent,
                    to_agent,
                    artifact,
                    ..
                } => handoffs.push((from_agent.as_str(), to_agent.as_str(), artifact.as_str())),
                EventKind::Decision { .. } => decision_log.push(event.clone()),
                EventKind::Collaboration { .. } => collaboration_patterns.push(event.clone()),
                EventKind::Issue {
                    description,
                    resolved,
                    ..
                } => {
                    if !resolved {
                        unresolved.push(description.clone());
                    }
                    issues_encountered.push(event.clone());
                }
                EventKind::SessionEnd {
                    total_duration_seconds,
                    ..
                } => duration_seconds = *total_duration_seconds,
                EventKind::SessionStart { .. } | EventKind::Checkpoint { .. } => {}
            }
        }

        for stats in agent_statistics.values_mut() {
            stats.avg_duration_ms = if stats.actions_count > 0 {
                stats.total_duration_ms as f64 / stats.actions_count as f64
            } else {
                0.0
            };
        }

        if !unresolved.is_empty() {
            bottlenecks.push(Bottleneck::UnresolvedIssues {
                count: unresolved.len(),
                issues: unresolved,
                recommendation: "Resolve outstanding issues before deployment".to_string(),
            });
        }

        let recommendations = recommend(handoffs.len(), &action_counts);

        Self {
            session_id: session_id.to_string(),
            generated_at: Utc::now(),
            summary: ReportSummary {
                total_events: events.len(),
                total_agents_involved: agent_statistics.len(),
                total_handoffs: handoffs.len(),
                total_decisions: decision_log.len(),
                total_issues: issues_encountered.len(),
                total_collaborations: collaboration_patterns.len(),
                duration_seconds,
            },
            agent_statistics,
            timeline,
            handoff_chain: render_handoff_chain(&handoffs),
            handoff_path: handoff_path(&handoffs),
            decision_log,
            issues_encountered,
            collaboration_patterns,
            bottlenecks,
            recommendations,
        }
    }

    /// Returns true when the handoff path contains pm, dev, qa and deploy
    /// back to back.
    pub fn is_waterfall(&self) -> bool {
        const WATERFALL: [&str; 4] = ["pm", "dev", "qa", "deploy"];
        self.handoff_path
            .windows(WATERFALL.len())
            .any(|window| window.iter().map(String::as_str).eq(WATERFALL))
    }
}

fn recommend(handoff_count: usize, action_counts: &BTreeMap<(String, String), usize>) -> Vec<String> {
    let mut recommendations = Vec::new();

    if handoff_count > PARALLELIZE_HANDOFFS {
        recommendations.push(
            "Consider parallelizing some agent tasks to reduce sequential handoffs".to_string(),
        );
    }

    for ((agent, action), count) in action_counts {
        if *count > REPEATED_ACTION_LIMIT {
            recommendations.push(format!(
                "{} performed '{}' {} times - consider caching or optimization",
                agent, action, count
            ));
        }
    }

    recommendations.extend(STANDARD_RECOMMENDATIONS.iter().map(|r| r.to_string()));
    recommendations
}

/// Renders handoffs as a box-and-arrow diagram, one block per handoff.
fn render_handoff_chain(handoffs: &[(&str, &str, &str)]) -> String {
    if handoffs.is_empty() {
        return "No handoffs recorded".to_string();
    }

    let mut lines = vec!["\n📋 Handoff Chain:\n".to_string()];
    for (i, (from, to, artifact)) in handoffs.iter().enumerate() {
        lines.push(format!("   Step {}:", i + 1));
        lines.push(format!("   ┌─ {}", from));
        lines.push(format!("   │  creates: {}", artifact));
        lines.push("   ↓".to_string());
        lines.push(format!("   └─ {} receives", to));
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Collapses handoffs into the sequence of agents the artifacts visited.
fn handoff_path(handoffs: &[(&str, &str, &str)]) -> Vec<String> {
    let mut path: Vec<String> = Vec::new();
    for (from, to, _) in handoffs {
        if path.last().map(String::as_str) != Some(*from) {
            path.push(from.to_string());
        }
        path.push(to.to_string());
    }
    path
}
