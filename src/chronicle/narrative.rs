//! Markdown narrative rendered from a [`Report`].

use super::config::ChronicleConfig;
use super::report::{Bottleneck, Report};
use super::types::{EventKind, CHRONICLE_VERSION};

/// Renders the prose narrative for a report.
pub fn render(report: &Report, config: &ChronicleConfig) -> String {
    let mut lines: Vec<String> = Vec::new();
    let summary = &report.summary;

    lines.push("# 📜 Chronicle Narrative".to_string());
    lines.push(String::new());
    lines.push(format!("## Session: {}", report.session_id));
    lines.push(format!(
        "**Generated:** {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(String::new());

    lines.push("## Executive Summary".to_string());
    lines.push(String::new());
    lines.push(format!(
        "This session involved **{} agents** working through **{} events** over {:.1} seconds.",
        summary.total_agents_involved, summary.total_events, summary.duration_seconds
    ));
    lines.push(String::new());
    lines.push(format!("- **Handoffs:** {}", summary.total_handoffs));
    lines.push(format!("- **Decisions:** {}", summary.total_decisions));
    lines.push(format!("- **Collaborations:** {}", summary.total_collaborations));
    lines.push(format!("- **Issues:** {}", summary.total_issues));
    lines.push(String::new());

    lines.push("## Agent Performance".to_string());
    lines.push(String::new());
    for (agent, stats) in &report.agent_statistics {
        lines.push(format!("### {}", agent.to_uppercase()));
        lines.push(format!("- Actions: {}", stats.actions_count));
        lines.push(format!(
            "- Total time: {:.1}s",
            stats.total_duration_ms as f64 / 1000.0
        ));
        lines.push(format!("- Average: {:.0}ms per action", stats.avg_duration_ms));
        lines.push(format!("- Sample actions: {}", stats.actions.join(", ")));
        lines.push(String::new());
    }

    lines.push("## Timeline of Events".to_string());
    lines.push(String::new());
    for entry in report.timeline.iter().take(config.timeline_excerpt) {
        lines.push(format!(
            "- `{}` #{} {}",
            entry.time.format("%H:%M:%S"),
            entry.sequence,
            entry.description
        ));
    }
    if report.timeline.len() > config.timeline_excerpt {
        lines.push(format!(
            "- ... and {} more events",
            report.timeline.len() - config.timeline_excerpt
        ));
    }
    lines.push(String::new());

    lines.push("## Handoff Chain".to_string());
    lines.push(String::new());
    lines.push("```".to_string());
    lines.push(report.handoff_chain.trim_start_matches('\n').to_string());
    lines.push("```".to_string());
    lines.push(String::new());

    lines.push("## Decisions Made".to_string());
    lines.push(String::new());
    if report.decision_log.is_empty() {
        lines.push("No decisions recorded.".to_string());
        lines.push(String::new());
    }
    for event in &report.decision_log {
        if let EventKind::Decision {
            agent,
            decision,
            rationale,
            alternatives,
        } = &event.kind
        {
            lines.push(format!("### {}: {}", agent, decision));
            lines.push(format!("**Rationale:** {}", rationale));
            if !alternatives.is_empty() {
                lines.push(format!(
                    "**Alternatives considered:** {}",
                    alternatives.join(", ")
                ));
            }
            lines.push(String::new());
        }
    }

    if !report.issues_encountered.is_empty() {
        lines.push("## Issues Encountered".to_string());
        lines.push(String::new());
        for event in &report.issues_encountered {
            if let EventKind::Issue {
                agent,
                issue_type,
                description,
                resolution,
                ..
            } = &event.kind
            {
                let outcome = match resolution {
                    Some(resolution) => format!("✅ Resolved: {}", resolution),
                    None => "⚠️ Unresolved".to_string(),
                };
                lines.push(format!(
                    "- **{}** [{}]: {} ({})",
                    agent, issue_type, description, outcome
                ));
            }
        }
        lines.push(String::new());
    }

    if !report.bottlenecks.is_empty() {
        lines.push("## Bottlenecks Identified".to_string());
        lines.push(String::new());
        for bottleneck in &report.bottlenecks {
            match bottleneck {
                Bottleneck::LongExecution {
                    agent,
                    action,
                    duration_ms,
                    recommendation,
                } => lines.push(format!(
                    "- **{}** `{}` took {}ms. {}",
                    agent, action, duration_ms, recommendation
                )),
                Bottleneck::UnresolvedIssues {
                    count,
                    recommendation,
                    ..
                } => lines.push(format!(
                    "- {} unresolved issue(s). {}",
                    count, recommendation
                )),
            }
        }
        lines.push(String::new());
    }

    lines.push("## Recommendations".to_string());
    lines.push(String::new());
    for (i, recommendation) in report.recommendations.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, recommendation));
    }
    lines.push(String::new());

    lines.push("## Key Insights".to_string());
    lines.push(String::new());
    lines.push("### How Agents Collaborated".to_string());
    lines.push(String::new());
    if report.collaboration_patterns.is_empty() {
        lines.push("Agents worked sequentially without joint activities.".to_string());
    }
    for event in &report.collaboration_patterns {
        if let EventKind::Collaboration {
            agents,
            activity,
            result,
        } = &event.kind
        {
            lines.push(format!("- {}: {} → {}", agents.join(" + "), activity, result));
        }
    }
    lines.push(String::new());
    lines.push("### Workflow Pattern".to_string());
    lines.push(String::new());
    if report.is_waterfall() {
        lines.push(
            "The agents followed a **waterfall** pattern: PM → Dev → QA → Deploy.".to_string(),
        );
    } else {
        lines.push("The agents followed a custom workflow.".to_string());
    }
    lines.push(String::new());

    lines.push("---".to_string());
    lines.push(format!("*Recorded by Chronicle Agent v{}*", CHRONICLE_VERSION));
    lines.push("*\"Preserving the history of AI collaboration\"*".to_string());
    lines.push(String::new());

    lines.join("\n")
}
