//! Catalog Researcher - offline market research from a built-in catalog.
//!
//! Matches the topic against a small catalog of market segments and reports
//! the competitors and pain points of every segment it mentions, plus a fixed
//! set of cross-market trends.

use async_trait::async_trait;
use tracing::info;

use crate::utils::timestamp_id;

use super::collaborators::MarketResearcher;
use super::error::{AgentError, AgentResult};
use super::types::MarketResearchSummary;

struct Segment {
    keywords: &'static [&'static str],
    competitors: &'static [&'static str],
    pain_points: &'static [&'static str],
}

const SEGMENTS: &[Segment] = &[
    Segment {
        keywords: &["todo", "task", "productivity"],
        competitors: &["Todoist", "Things", "Microsoft To Do"],
        pain_points: &[
            "Sync conflicts across devices",
            "Too many features for simple lists",
        ],
    },
    Segment {
        keywords: &["chat", "message", "messaging"],
        competitors: &["Slack", "Discord"],
        pain_points: &["Notification overload", "Slow search across channels"],
    },
    Segment {
        keywords: &["shop", "store", "commerce"],
        competitors: &["Shopify", "WooCommerce", "BigCommerce"],
        pain_points: &["High transaction fees", "Complex inventory setup"],
    },
    Segment {
        keywords: &["blog", "cms", "content"],
        competitors: &["WordPress", "Ghost"],
        pain_points: &["Plugin maintenance burden"],
    },
];

const GENERIC_PAIN_POINTS: &[&str] = &["Onboarding takes too long", "Pricing is unclear"];

const TRENDS: &[&str] = &[
    "AI-assisted workflows",
    "Privacy-first data handling",
    "Mobile-first usage",
];

/// Market researcher backed by the built-in catalog.
#[derive(Debug, Default, Clone)]
pub struct CatalogResearcher;

impl CatalogResearcher {
    pub const AGENT_NAME: &'static str = "web_scraper";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MarketResearcher for CatalogResearcher {
    async fn research(&self, topic: &str) -> AgentResult<MarketResearchSummary> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AgentError::InvalidInput(
                "research topic cannot be empty".to_string(),
            ));
        }

        let lowered = topic.to_lowercase();
        let matched: Vec<&Segment> = SEGMENTS
            .iter()
            .filter(|s| s.keywords.iter().any(|k| lowered.contains(k)))
            .collect();

        let competitors: Vec<&str> = matched
            .iter()
            .flat_map(|s| s.competitors.iter().copied())
            .collect();
        let mut pain_points: Vec<&str> = matched
            .iter()
            .flat_map(|s| s.pain_points.iter().copied())
            .collect();
        if pain_points.is_empty() {
            pain_points.extend(GENERIC_PAIN_POINTS);
        }

        let opportunity = match competitors.len() {
            0 => "Greenfield opportunity: no direct competitors found",
            1..=3 => "Moderate competition: room for a focused product",
            _ => "Crowded market: differentiate on the top pain point",
        };

        let mut insights = vec![opportunity.to_string()];
        if let Some(top) = pain_points.first() {
            insights.push(format!("Top pain point: {}", top));
        }
        if !competitors.is_empty() {
            insights.push(format!("Main competitors: {}", competitors.join(", ")));
        }

        info!(
            topic,
            competitors = competitors.len(),
            pain_points = pain_points.len(),
            "Market research complete"
        );

        Ok(MarketResearchSummary {
            research_id: timestamp_id("research"),
            competitor_count: competitors.len(),
            trend_count: TRENDS.len(),
            pain_point_count: pain_points.len(),
            insights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_segment() {
        let summary = CatalogResearcher::new()
            .research("A simple Todo app for teams")
            .await
            .expect("research failed");

        assert_eq!(summary.competitor_count, 3);
        assert_eq!(summary.pain_point_count, 2);
        assert_eq!(summary.trend_count, 3);
        assert!(summary.insights[0].starts_with("Moderate competition"));
        assert!(summary.research_id.starts_with("research_"));
    }

    #[tokio::test]
    async fn test_unknown_topic_uses_generic_pain_points() {
        let summary = CatalogResearcher::new()
            .research("quantum knitting planner")
            .await
            .expect("research failed");

        assert_eq!(summary.competitor_count, 0);
        assert_eq!(summary.pain_point_count, GENERIC_PAIN_POINTS.len());
        assert!(summary.insights[0].starts_with("Greenfield"));
    }

    #[tokio::test]
    async fn test_multiple_segments_accumulate() {
        let summary = CatalogResearcher::new()
            .research("chat-driven online store")
            .await
            .expect("research failed");

        assert_eq!(summary.competitor_count, 5);
        assert!(summary.insights[0].starts_with("Crowded market"));
    }

    #[tokio::test]
    async fn test_empty_topic_rejected() {
        let result = CatalogResearcher::new().research("   ").await;
        assert!(matches!(result, Err(AgentError::InvalidInput(_))));
    }
}
