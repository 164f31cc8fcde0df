//! Static Tester - scores a generated codebase without executing it.
//!
//! Three check categories contribute to a weighted score:
//!
//! | Category        | Weight | Checks                                          |
//! |-----------------|--------|-------------------------------------------------|
//! | `structure`     | 0.4    | every generated file exists and is non-empty    |
//! | `acceptance`    | 0.4    | every acceptance criterion id is referenced     |
//! | `configuration` | 0.2    | compose file declares services, env sets a port |
//!
//! Categories with no checks are left out of the weighting.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use tokio::fs;
use tracing::{debug, info};

use super::collaborators::Tester;
use super::error::{AgentError, AgentResult};
use super::feature_store::FeatureStore;
use super::types::{CheckResult, FeatureSpec, TestReport, TestStatus, TestSummary};

const CATEGORY_WEIGHTS: &[(&str, f64)] = &[
    ("structure", 0.4),
    ("acceptance", 0.4),
    ("configuration", 0.2),
];

/// Configuration files and the marker each one must contain.
const CONFIG_MARKERS: &[(&str, &str)] = &[
    ("docker-compose.yml", "services:"),
    (".env.example", "PORT="),
];

const CRITERION_PATTERN: &str = r"AC-\d+-\d+";

/// Tester running static checks over `projects/{feature_id}/codebase`.
#[derive(Debug, Clone)]
pub struct StaticTester {
    store: FeatureStore,
}

impl StaticTester {
    pub const AGENT_NAME: &'static str = "qa";

    pub fn new(store: FeatureStore) -> Self {
        Self { store }
    }
}

async fn read_non_empty(path: &Path) -> Option<String> {
    match fs::read_to_string(path).await {
        Ok(contents) if !contents.trim().is_empty() => Some(contents),
        _ => None,
    }
}

fn check(category: &str, name: impl Into<String>, passed: bool, details: String) -> CheckResult {
    CheckResult {
        category: category.to_string(),
        name: name.into(),
        passed,
        details: if passed { String::new() } else { details },
    }
}

async fn run_checks(spec: &FeatureSpec, codebase: &Path) -> AgentResult<Vec<CheckResult>> {
    let mut checks = Vec::new();
    let mut corpus = String::new();

    for relative in &spec.generated_files {
        let contents = read_non_empty(&codebase.join(relative)).await;
        checks.push(check(
            "structure",
            relative.clone(),
            contents.is_some(),
            "file is missing or empty".to_string(),
        ));
        if let Some(contents) = contents {
            corpus.push_str(&contents);
            corpus.push('\n');
        }
    }

    let pattern = Regex::new(CRITERION_PATTERN)?;
    let referenced: BTreeSet<&str> = pattern.find_iter(&corpus).map(|m| m.as_str()).collect();
    for criterion in spec.user_stories.iter().flat_map(|s| &s.acceptance_criteria) {
        checks.push(check(
            "acceptance",
            criterion.id.clone(),
            referenced.contains(criterion.id.as_str()),
            format!("criterion not referenced: {}", criterion.description),
        ));
    }

    for (file, marker) in CONFIG_MARKERS {
        let passed = read_non_empty(&codebase.join(file))
            .await
            .is_some_and(|contents| contents.contains(marker));
        checks.push(check(
            "configuration",
            *file,
            passed,
            format!("expected '{}'", marker),
        ));
    }

    Ok(checks)
}

/// Scores checks per category and combines them into an overall score.
fn score(checks: &[CheckResult]) -> (f64, BTreeMap<String, f64>) {
    let mut category_scores = BTreeMap::new();
    let mut weighted = 0.0;
    let mut total_weight = 0.0;

    for (category, weight) in CATEGORY_WEIGHTS {
        let in_category: Vec<&CheckResult> =
            checks.iter().filter(|c| c.category == *category).collect();
        if in_category.is_empty() {
            continue;
        }
        let passed = in_category.iter().filter(|c| c.passed).count();
        let category_score = round2(passed as f64 / in_category.len() as f64 * 100.0);
        category_scores.insert(category.to_string(), category_score);
        weighted += category_score * weight;
        total_weight += weight;
    }

    let overall = if total_weight > 0.0 {
        round2(weighted / total_weight)
    } else {
        0.0
    };
    (overall, category_scores)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn recommendations(checks: &[CheckResult]) -> Vec<String> {
    let mut recommendations: Vec<String> = checks
        .iter()
        .filter(|c| !c.passed)
        .map(|c| match c.category.as_str() {
            "structure" => format!("Regenerate {}", c.name),
            "acceptance" => format!("Cover {} in code or tests", c.name),
            _ => format!("Fix {}: {}", c.name, c.details),
        })
        .collect();
    if recommendations.is_empty() {
        recommendations.push("Add runtime tests once the scaffold is implemented".to_string());
    }
    recommendations
}

#[async_trait]
impl Tester for StaticTester {
    async fn test(&self, feature_id: &str) -> AgentResult<TestSummary> {
        let mut spec = self.store.load(feature_id).await?;
        let codebase = spec.codebase_dir.clone().ok_or_else(|| {
            AgentError::stage_failed(
                Self::AGENT_NAME,
                format!("feature {} has no generated codebase", feature_id),
            )
        })?;

        let checks = run_checks(&spec, &codebase).await?;
        let (overall_score, category_scores) = score(&checks);
        let status = TestStatus::from_score(overall_score);

        debug!(
            feature_id,
            checks = checks.len(),
            failed = checks.iter().filter(|c| !c.passed).count(),
            "Static checks complete"
        );
        info!(feature_id, score = overall_score, status = %status, "Feature tested");

        let summary = TestSummary {
            feature_id: feature_id.to_string(),
            overall_score,
            status,
            full_report: TestReport {
                recommendations: recommendations(&checks),
                checks,
                category_scores,
            },
        };

        spec.test_results = Some(summary.clone());
        spec.status = "tested".to_string();
        self.store.save(&mut spec).await?;

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::collaborators::Developer;
    use crate::agents::developer::ScaffoldDeveloper;
    use crate::agents::feature_store::tests::sample_spec;
    use tempfile::TempDir;

    async fn developed_feature(dir: &TempDir, id: &str) -> FeatureStore {
        let store = FeatureStore::new(dir.path());
        let mut spec = sample_spec(id);
        store.save(&mut spec).await.expect("save failed");
        ScaffoldDeveloper::new(store.clone())
            .develop(id)
            .await
            .expect("develop failed");
        store
    }

    #[tokio::test]
    async fn test_generated_scaffold_passes() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = developed_feature(&dir, "feat_qa").await;

        let summary = StaticTester::new(store.clone())
            .test("feat_qa")
            .await
            .expect("test failed");

        assert_eq!(summary.overall_score, 100.0);
        assert_eq!(summary.status, TestStatus::Passed);
        assert_eq!(summary.full_report.category_scores.len(), 3);

        let spec = store.load("feat_qa").await.expect("load failed");
        assert_eq!(spec.status, "tested");
        assert_eq!(spec.test_results, Some(summary));
    }

    #[tokio::test]
    async fn test_missing_files_lower_score() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = developed_feature(&dir, "feat_broken").await;
        let codebase = store.codebase_dir("feat_broken");
        std::fs::remove_file(codebase.join("tests/ACCEPTANCE.md")).expect("remove failed");
        std::fs::remove_file(codebase.join("README.md")).expect("remove failed");
        std::fs::write(codebase.join("docker-compose.yml"), "").expect("truncate failed");

        let summary = StaticTester::new(store)
            .test("feat_broken")
            .await
            .expect("test failed");

        // structure 3/6 = 50, acceptance 0/1 = 0, configuration 1/2 = 50
        let scores = &summary.full_report.category_scores;
        assert_eq!(scores.get("structure"), Some(&50.0));
        assert_eq!(scores.get("acceptance"), Some(&0.0));
        assert_eq!(scores.get("configuration"), Some(&50.0));
        assert_eq!(summary.overall_score, 30.0);
        assert_eq!(summary.status, TestStatus::Failed);
        assert!(summary
            .full_report
            .recommendations
            .contains(&"Cover AC-1-1 in code or tests".to_string()));
    }

    #[tokio::test]
    async fn test_undeveloped_feature_fails_stage() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = FeatureStore::new(dir.path());
        let mut spec = sample_spec("feat_raw");
        store.save(&mut spec).await.expect("save failed");

        let result = StaticTester::new(store).test("feat_raw").await;
        assert!(matches!(result, Err(AgentError::StageFailed { .. })));
    }

    #[test]
    fn test_score_skips_empty_categories() {
        let checks = vec![
            check("structure", "a", true, String::new()),
            check("structure", "b", false, "missing".to_string()),
        ];
        let (overall, categories) = score(&checks);
        assert_eq!(overall, 50.0);
        assert_eq!(categories.len(), 1);
        assert_eq!(score(&[]).0, 0.0);
    }
}
