//! Collaborator contracts: one trait per pipeline stage.
//!
//! The orchestrator only sees these traits. Each has a single entry point
//! returning a typed summary, so implementations can be swapped for tests or
//! for agents backed by remote services.

use async_trait::async_trait;

use super::error::AgentResult;
use super::types::{
    DeploymentSummary, DevelopmentSummary, MarketResearchSummary, ReverseEngineerSummary,
    SpecSummary, TestSummary,
};

/// Analyzes an existing codebase and reconstructs a specification from it.
#[async_trait]
pub trait ReverseEngineer: Send + Sync {
    /// Agent name recorded in the Chronicle.
    fn name(&self) -> &str {
        "reverse_engineer"
    }

    async fn analyze(&self, source: &str) -> AgentResult<ReverseEngineerSummary>;
}

/// Gathers competitor, trend and pain-point data for a topic.
#[async_trait]
pub trait MarketResearcher: Send + Sync {
    fn name(&self) -> &str {
        "web_scraper"
    }

    async fn research(&self, topic: &str) -> AgentResult<MarketResearchSummary>;
}

/// Turns an idea into a stored feature specification.
#[async_trait]
pub trait SpecWriter: Send + Sync {
    fn name(&self) -> &str {
        "pm"
    }

    /// Creates a new feature. The returned id keys every later stage.
    async fn create(&self, idea: &str, tech_stack: Option<&str>) -> AgentResult<SpecSummary>;
}

/// Generates source files for a specified feature.
#[async_trait]
pub trait Developer: Send + Sync {
    fn name(&self) -> &str {
        "dev"
    }

    async fn develop(&self, feature_id: &str) -> AgentResult<DevelopmentSummary>;
}

/// Tests a developed feature and scores it from 0 to 100.
#[async_trait]
pub trait Tester: Send + Sync {
    fn name(&self) -> &str {
        "qa"
    }

    async fn test(&self, feature_id: &str) -> AgentResult<TestSummary>;
}

/// Deploys a tested feature.
#[async_trait]
pub trait Deployer: Send + Sync {
    fn name(&self) -> &str {
        "deploy"
    }

    async fn deploy(
        &self,
        feature_id: &str,
        environment: &str,
        platform: &str,
    ) -> AgentResult<DeploymentSummary>;
}
