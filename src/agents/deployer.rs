//! Local Deployer - records a deployment of a tested feature.
//!
//! Nothing is actually provisioned. The deployer validates the target,
//! derives the urls the platform would expose and writes a deployment record
//! under `projects/{feature_id}/deployments/`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::info;

use crate::storage::JsonStore;
use crate::utils::timestamp_id;

use super::collaborators::Deployer;
use super::error::{AgentError, AgentResult};
use super::feature_store::FeatureStore;
use super::types::DeploymentSummary;

/// Environments a feature can be deployed to.
pub const ENVIRONMENTS: &[&str] = &["local", "staging", "production"];

/// Platforms with known url layouts.
pub const PLATFORMS: &[&str] = &["docker", "kubernetes", "vercel"];

/// Deployer producing deployment records for local inspection.
#[derive(Debug, Clone)]
pub struct LocalDeployer {
    store: FeatureStore,
}

impl LocalDeployer {
    pub const AGENT_NAME: &'static str = "deploy";

    pub fn new(store: FeatureStore) -> Self {
        Self { store }
    }
}

fn platform_urls(
    feature_id: &str,
    environment: &str,
    platform: &str,
) -> AgentResult<BTreeMap<String, String>> {
    let urls: Vec<(&str, String)> = match platform {
        "docker" => vec![
            ("application", "http://localhost:3000".to_string()),
            ("api", "http://localhost:3001".to_string()),
            ("api_docs", "http://localhost:3001/api-docs".to_string()),
        ],
        "kubernetes" => {
            let host = format!("{}.{}.svc.cluster.local", feature_id, environment);
            vec![
                ("application", format!("http://{}", host)),
                ("api", format!("http://{}/api", host)),
            ]
        }
        "vercel" => vec![("application", format!("https://{}.vercel.app", feature_id))],
        other => {
            return Err(AgentError::InvalidInput(format!(
                "Unknown platform '{}', expected one of: {}",
                other,
                PLATFORMS.join(", ")
            )))
        }
    };

    Ok(urls
        .into_iter()
        .map(|(name, url)| (name.to_string(), url))
        .collect())
}

#[async_trait]
impl Deployer for LocalDeployer {
    async fn deploy(
        &self,
        feature_id: &str,
        environment: &str,
        platform: &str,
    ) -> AgentResult<DeploymentSummary> {
        if !ENVIRONMENTS.contains(&environment) {
            return Err(AgentError::InvalidInput(format!(
                "Unknown environment '{}', expected one of: {}",
                environment,
                ENVIRONMENTS.join(", ")
            )));
        }

        let mut spec = self.store.load(feature_id).await?;
        if spec.codebase_dir.is_none() {
            return Err(AgentError::stage_failed(
                Self::AGENT_NAME,
                format!("feature {} has no generated codebase", feature_id),
            ));
        }

        let urls = platform_urls(feature_id, environment, platform)?;
        let summary = DeploymentSummary {
            feature_id: feature_id.to_string(),
            deployment_id: timestamp_id("deploy"),
            environment: environment.to_string(),
            platform: platform.to_string(),
            status: "deployed".to_string(),
            urls,
        };

        let records = JsonStore::new(self.store.feature_dir(feature_id).join("deployments"));
        let path = records.save(&summary.deployment_id, &summary).await?;

        spec.deployments.push(summary.clone());
        spec.status = format!("deployed_{}", environment);
        self.store.save(&mut spec).await?;

        info!(
            feature_id,
            environment,
            platform,
            record = %path.display(),
            "Feature deployed"
        );

        Ok(summary)
    }
}
