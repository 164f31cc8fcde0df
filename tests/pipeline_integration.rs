//! Integration tests for the pipeline orchestrator.
//!
//! Scripted collaborators drive the orchestrator through every terminal path;
//! the last tests run the built-in agents end to end on a temp directory.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use devforge::agents::{
    AgentError, AgentResult, DeploymentSummary, Deployer, DevelopmentSummary,
    Developer, MarketResearchSummary, MarketResearcher, ReconstructedSpec, ReverseEngineer,
    ReverseEngineerSummary, SpecSummary, SpecWriter, TechStack, TestReport, TestStatus,
    TestSummary, Tester,
};
use devforge::chronicle::{ChronicleConfig, ChronicleRecorder, EventKind};
use devforge::pipeline::{
    AgentSet, PipelineConfig, PipelineOrchestrator, PipelineRequest, PipelineRun, RunStatus,
    StageFailure,
};

/// How the scripted development stage behaves.
#[derive(Clone, Copy)]
enum DevBehavior {
    Succeed,
    Fail,
    MissingSpec,
}

/// Collaborator playing every stage from a script.
struct Scripted {
    score: f64,
    dev: DevBehavior,
    qa_delay: Duration,
    deploys: AtomicUsize,
}

impl Scripted {
    fn scoring(score: f64) -> Self {
        Self {
            score,
            dev: DevBehavior::Succeed,
            qa_delay: Duration::ZERO,
            deploys: AtomicUsize::new(0),
        }
    }

    fn with_dev(mut self, dev: DevBehavior) -> Self {
        self.dev = dev;
        self
    }

    fn with_qa_delay(mut self, delay: Duration) -> Self {
        self.qa_delay = delay;
        self
    }

    fn deploy_count(&self) -> usize {
        self.deploys.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseEngineer for Scripted {
    async fn analyze(&self, _source: &str) -> AgentResult<ReverseEngineerSummary> {
        Ok(ReverseEngineerSummary {
            analysis_id: "analysis_test".to_string(),
            tech_stack_guess: Some("Python".to_string()),
            reconstructed_spec: ReconstructedSpec {
                title: "Inventory Service".to_string(),
                description: "Tracks stock levels".to_string(),
                purpose: "Inventory management".to_string(),
            },
            file_metrics: Default::default(),
        })
    }
}

#[async_trait]
impl MarketResearcher for Scripted {
    async fn research(&self, _topic: &str) -> AgentResult<MarketResearchSummary> {
        Ok(MarketResearchSummary {
            research_id: "research_test".to_string(),
            competitor_count: 2,
            trend_count: 3,
            pain_point_count: 1,
            insights: vec!["Users want offline mode".to_string()],
        })
    }
}

#[async_trait]
impl SpecWriter for Scripted {
    async fn create(&self, _idea: &str, _tech_stack: Option<&str>) -> AgentResult<SpecSummary> {
        Ok(SpecSummary {
            feature_id: "feat_test".to_string(),
            title: "Todo App".to_string(),
            user_story_count: 3,
            acceptance_criteria_count: 6,
        })
    }
}

#[async_trait]
impl Developer for Scripted {
    async fn develop(&self, feature_id: &str) -> AgentResult<DevelopmentSummary> {
        match self.dev {
            DevBehavior::Succeed => Ok(DevelopmentSummary {
                feature_id: feature_id.to_string(),
                tech_stack_used: TechStack::default(),
                files_generated_count: 6,
            }),
            DevBehavior::Fail => Err(AgentError::stage_failed("dev", "template engine crashed")),
            DevBehavior::MissingSpec => Err(AgentError::MissingArtifact {
                feature_id: feature_id.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Tester for Scripted {
    async fn test(&self, feature_id: &str) -> AgentResult<TestSummary> {
        if !self.qa_delay.is_zero() {
            tokio::time::sleep(self.qa_delay).await;
        }
        Ok(TestSummary {
            feature_id: feature_id.to_string(),
            overall_score: self.score,
            status: TestStatus::from_score(self.score),
            full_report: TestReport::default(),
        })
    }
}

#[async_trait]
impl Deployer for Scripted {
    async fn deploy(
        &self,
        feature_id: &str,
        environment: &str,
        platform: &str,
    ) -> AgentResult<DeploymentSummary> {
        self.deploys.fetch_add(1, Ordering::SeqCst);
        let mut urls = BTreeMap::new();
        urls.insert("application".to_string(), "http://localhost:3000".to_string());
        Ok(DeploymentSummary {
            feature_id: feature_id.to_string(),
            deployment_id: "deploy_test".to_string(),
            environment: environment.to_string(),
            platform: platform.to_string(),
            status: "deployed".to_string(),
            urls,
        })
    }
}

fn agent_set(agent: &Arc<Scripted>) -> AgentSet {
    AgentSet {
        reverse_engineer: agent.clone(),
        market_researcher: agent.clone(),
        spec_writer: agent.clone(),
        developer: agent.clone(),
        tester: agent.clone(),
        deployer: agent.clone(),
    }
}

fn test_config(dir: &TempDir) -> PipelineConfig {
    PipelineConfig::new()
        .with_data_dir(dir.path().join("data"))
        .with_projects_dir(dir.path().join("projects"))
        .with_chronicle(ChronicleConfig::new().with_output_dir(dir.path().join("chronicle")))
}

fn scripted_orchestrator(config: PipelineConfig, agent: &Arc<Scripted>) -> PipelineOrchestrator {
    let chronicle = Arc::new(ChronicleRecorder::new(config.chronicle.clone()));
    PipelineOrchestrator::new(config, agent_set(agent), chronicle)
        .expect("config should be valid")
}

fn step_names(run: &PipelineRun) -> Vec<&'static str> {
    run.steps.iter().map(|s| s.stage().step_name()).collect()
}

#[tokio::test]
async fn test_successful_run_deploys_and_records_waterfall() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let agent = Arc::new(Scripted::scoring(92.0));
    let orchestrator = scripted_orchestrator(test_config(&dir), &agent);

    let run = orchestrator
        .run_full_pipeline(PipelineRequest::new("todo app").with_environment("staging"))
        .await
        .expect("pipeline should finish");

    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(run.feature_id.as_deref(), Some("feat_test"));
    assert!(run.completed_at.is_some());
    assert_eq!(
        step_names(&run),
        vec!["web_scraper", "pm", "dev", "qa", "deploy"]
    );
    assert_eq!(agent.deploy_count(), 1);

    let report = run.chronicle.as_ref().expect("report attached");
    assert!(report.is_waterfall());
    assert_eq!(report.summary.total_handoffs, 5);
    assert_eq!(report.summary.total_decisions, 1);
    assert_eq!(report.summary.total_collaborations, 1);
    assert!(report.handoff_chain.contains("deploy"));
    assert!(report.session_id.ends_with("_todo_app"));

    let stats = orchestrator.stats().await;
    assert_eq!(stats.total_runs, 1);
    assert_eq!(stats.successful, 1);
}

#[tokio::test]
async fn test_score_below_gate_halts_before_deploy() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let agent = Arc::new(Scripted::scoring(49.0));
    let orchestrator = scripted_orchestrator(test_config(&dir), &agent);

    let run = orchestrator
        .run_full_pipeline(PipelineRequest::new("todo app"))
        .await
        .expect("pipeline should finish");

    assert_eq!(run.status, RunStatus::FailedQa);
    assert_eq!(run.test_score(), Some(49.0));
    assert_eq!(step_names(&run), vec!["web_scraper", "pm", "dev", "qa"]);
    assert_eq!(agent.deploy_count(), 0);

    let report = run.chronicle.as_ref().expect("report attached");
    assert_eq!(report.summary.total_issues, 1);
    assert!(!report.is_waterfall());
    match &report.issues_encountered[0].kind {
        EventKind::Issue {
            issue_type,
            resolution,
            ..
        } => {
            assert_eq!(issue_type, "low_test_score");
            assert_eq!(resolution.as_deref(), Some("Pipeline halted for fixes"));
        }
        other => panic!("expected issue event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_score_at_gate_deploys() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let agent = Arc::new(Scripted::scoring(50.0));
    let orchestrator = scripted_orchestrator(test_config(&dir), &agent);

    let run = orchestrator
        .run_full_pipeline(PipelineRequest::new("todo app"))
        .await
        .expect("pipeline should finish");

    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(agent.deploy_count(), 1);
}

#[tokio::test]
async fn test_configured_gate_is_honored() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let agent = Arc::new(Scripted::scoring(75.0));
    let config = test_config(&dir).with_quality_gate_threshold(80.0);
    let orchestrator = scripted_orchestrator(config, &agent);

    let run = orchestrator
        .run_full_pipeline(PipelineRequest::new("todo app"))
        .await
        .expect("pipeline should finish");

    assert_eq!(run.status, RunStatus::FailedQa);
    assert_eq!(agent.deploy_count(), 0);
}

#[tokio::test]
async fn test_stage_error_fails_run_and_closes_session() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let agent = Arc::new(Scripted::scoring(92.0).with_dev(DevBehavior::Fail));
    let orchestrator = scripted_orchestrator(test_config(&dir), &agent);

    let run = orchestrator
        .run_full_pipeline(PipelineRequest::new("todo app"))
        .await
        .expect("pipeline should finish");

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.failure, Some(StageFailure::Exception));
    let error = run.error.as_deref().expect("error recorded");
    assert!(error.contains("template engine crashed"));
    assert_eq!(step_names(&run), vec!["web_scraper", "pm"]);
    assert_eq!(agent.deploy_count(), 0);

    // The session is closed, not left open for the next run.
    assert!(orchestrator.chronicle().active_session_id().is_none());
    let report = run.chronicle.as_ref().expect("report attached");
    let last = report.timeline.last().expect("timeline not empty");
    assert_eq!(last.event_type, "session_end");
    assert!(last.description.contains("failed"));
}

#[tokio::test]
async fn test_missing_artifact_is_classified() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let agent = Arc::new(Scripted::scoring(92.0).with_dev(DevBehavior::MissingSpec));
    let orchestrator = scripted_orchestrator(test_config(&dir), &agent);

    let run = orchestrator
        .run_full_pipeline(PipelineRequest::new("todo app"))
        .await
        .expect("pipeline should finish");

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.failure, Some(StageFailure::MissingArtifact));
}

#[tokio::test]
async fn test_slow_stage_times_out() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let agent = Arc::new(Scripted::scoring(92.0).with_qa_delay(Duration::from_secs(5)));
    let config = test_config(&dir).with_stage_timeout(Duration::from_millis(50));
    let orchestrator = scripted_orchestrator(config, &agent);

    let run = orchestrator
        .run_full_pipeline(PipelineRequest::new("todo app"))
        .await
        .expect("pipeline should finish");

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.failure, Some(StageFailure::StageTimeout));
    assert_eq!(agent.deploy_count(), 0);

    let report = run.chronicle.as_ref().expect("report attached");
    let timed_out = report.issues_encountered.iter().any(|event| {
        matches!(&event.kind, EventKind::Issue { issue_type, .. } if issue_type == "stage_timeout")
    });
    assert!(timed_out);
}

#[tokio::test]
async fn test_run_record_is_written_on_every_path() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let agent = Arc::new(Scripted::scoring(10.0));
    let orchestrator = scripted_orchestrator(test_config(&dir), &agent);

    let run = orchestrator
        .run_full_pipeline(PipelineRequest::new("todo app"))
        .await
        .expect("pipeline should finish");

    let path = orchestrator.runs().record_path(&run.pipeline_id);
    assert!(path.exists());
    let loaded = orchestrator
        .runs()
        .load(&run.pipeline_id)
        .await
        .expect("record should load");
    assert_eq!(loaded, run);
    assert_eq!(
        orchestrator.runs().list().await.expect("list failed"),
        vec![run.pipeline_id.clone()]
    );

    let sessions = orchestrator
        .chronicle()
        .store()
        .list_sessions()
        .await
        .expect("list failed");
    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn test_back_to_back_runs_keep_separate_records() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let agent = Arc::new(Scripted::scoring(92.0));
    let orchestrator = scripted_orchestrator(test_config(&dir), &agent);

    let first = orchestrator
        .run_full_pipeline(PipelineRequest::new("todo app"))
        .await
        .expect("pipeline should finish");
    let second = orchestrator
        .run_full_pipeline(PipelineRequest::new("todo app"))
        .await
        .expect("pipeline should finish");

    assert_ne!(first.pipeline_id, second.pipeline_id);
    let first_session = &first.chronicle.as_ref().expect("report attached").session_id;
    let second_session = &second.chronicle.as_ref().expect("report attached").session_id;
    assert_ne!(first_session, second_session);

    assert_eq!(orchestrator.runs().list().await.expect("list failed").len(), 2);
    let sessions = orchestrator
        .chronicle()
        .store()
        .list_sessions()
        .await
        .expect("list failed");
    assert_eq!(sessions.len(), 2);

    let reloaded = orchestrator
        .runs()
        .load(&first.pipeline_id)
        .await
        .expect("first record should survive");
    assert_eq!(reloaded, first);
}

#[tokio::test]
async fn test_source_request_uses_reverse_engineer() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let agent = Arc::new(Scripted::scoring(92.0));
    let orchestrator = scripted_orchestrator(test_config(&dir), &agent);

    let run = orchestrator
        .run_full_pipeline(PipelineRequest::from_source("/srv/inventory"))
        .await
        .expect("pipeline should finish");

    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(
        step_names(&run),
        vec!["reverse_engineer", "pm", "dev", "qa", "deploy"]
    );
    let report = run.chronicle.as_ref().expect("report attached");
    assert_eq!(report.handoff_path[0], "reverse_engineer");
}

// ============================================================================
// Built-in agents
// ============================================================================

#[tokio::test]
async fn test_builtin_agents_end_to_end() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let orchestrator =
        PipelineOrchestrator::with_builtin_agents(test_config(&dir)).expect("valid config");

    let run = orchestrator
        .run_full_pipeline(PipelineRequest::new("todo app with reminders").with_tech_stack("python"))
        .await
        .expect("pipeline should finish");

    assert_eq!(run.status, RunStatus::Success, "error: {:?}", run.error);
    let feature_id = run.feature_id.clone().expect("feature id");
    assert!(dir.path().join("projects").join(&feature_id).exists());
    assert_eq!(run.test_score(), Some(100.0));

    let narrative = orchestrator
        .chronicle()
        .store()
        .load_narrative(&run.chronicle.as_ref().expect("report attached").session_id)
        .await
        .expect("narrative should load");
    assert!(!narrative.is_empty());
}

#[tokio::test]
async fn test_builtin_single_stages_share_feature_store() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let orchestrator =
        PipelineOrchestrator::with_builtin_agents(test_config(&dir)).expect("valid config");

    let spec = orchestrator
        .create_spec("recipe sharing app", None)
        .await
        .expect("spec");
    orchestrator.develop(&spec.feature_id).await.expect("develop");
    let tested = orchestrator.test(&spec.feature_id).await.expect("test");
    assert!(tested.overall_score >= 50.0);

    let deployed = orchestrator
        .deploy(&spec.feature_id, Some("production"), Some("vercel"))
        .await
        .expect("deploy");
    assert_eq!(deployed.environment, "production");
    assert!(deployed.urls.values().any(|url| url.contains("vercel.app")));

    let missing = orchestrator.develop("feat_unknown").await;
    assert!(matches!(missing, Err(AgentError::MissingArtifact { .. })));
}
