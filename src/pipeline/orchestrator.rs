//! Pipeline orchestrator driving one feature from idea to deployment.
//!
//! This module provides the `PipelineOrchestrator` that coordinates:
//! - The fixed stage sequence and the quality gate
//! - Per-stage timeouts and duration measurement
//! - Chronicle recording of every stage
//! - Run records written on every terminal path

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::agents::{
    AgentError, AgentResult, CatalogResearcher, CodebaseAnalyzer, Deployer, DeploymentSummary,
    Developer, DevelopmentSummary, FeatureStore, LocalDeployer, MarketResearcher,
    ReverseEngineer, ReverseEngineerSummary, ScaffoldDeveloper, SpecSummary, SpecWriter,
    StaticTester, TemplateSpecWriter, TestStatus, TestSummary, Tester,
};
use crate::chronicle::{ActionMetadata, CheckpointStatus, ChronicleRecorder};
use crate::error::{ChronicleError, PipelineResult};
use crate::utils::slug_label;

use super::config::PipelineConfig;
use super::run::{PipelineRun, RunStatus, RunStore};
use super::stage::{PipelineStage, StageFailure, StageResult};

/// Maximum length of the Chronicle session label derived from the idea.
const SESSION_LABEL_CHARS: usize = 30;

/// Trigger recorded on sessions opened by a full pipeline run.
const PIPELINE_TRIGGER: &str = "pipeline_run";

/// Recipient of the final deployment handoff.
const END_USER: &str = "user";

// ============================================================================
// Agents and requests
// ============================================================================

/// The collaborators invoked by the orchestrator, one per stage.
#[derive(Clone)]
pub struct AgentSet {
    pub reverse_engineer: Arc<dyn ReverseEngineer>,
    pub market_researcher: Arc<dyn MarketResearcher>,
    pub spec_writer: Arc<dyn SpecWriter>,
    pub developer: Arc<dyn Developer>,
    pub tester: Arc<dyn Tester>,
    pub deployer: Arc<dyn Deployer>,
}

impl AgentSet {
    /// Built-in agents sharing a feature store rooted at `projects_dir`.
    pub fn builtin(projects_dir: impl Into<PathBuf>) -> Self {
        let store = FeatureStore::new(projects_dir);
        Self {
            reverse_engineer: Arc::new(CodebaseAnalyzer::new()),
            market_researcher: Arc::new(CatalogResearcher::new()),
            spec_writer: Arc::new(TemplateSpecWriter::new(store.clone())),
            developer: Arc::new(ScaffoldDeveloper::new(store.clone())),
            tester: Arc::new(StaticTester::new(store.clone())),
            deployer: Arc::new(LocalDeployer::new(store)),
        }
    }
}

impl fmt::Debug for AgentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSet")
            .field("reverse_engineer", &self.reverse_engineer.name())
            .field("market_researcher", &self.market_researcher.name())
            .field("spec_writer", &self.spec_writer.name())
            .field("developer", &self.developer.name())
            .field("tester", &self.tester.name())
            .field("deployer", &self.deployer.name())
            .finish()
    }
}

/// Input of a full pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineRequest {
    /// Feature idea. Replaced by the reconstructed title when `source` is set.
    pub idea: String,
    /// Preferred tech stack, free text.
    pub tech_stack: Option<String>,
    /// Local codebase to reverse engineer instead of researching the market.
    pub source: Option<String>,
    /// Deployment environment; the configured default when absent.
    pub environment: Option<String>,
    /// Deployment platform; the configured default when absent.
    pub platform: Option<String>,
}

impl PipelineRequest {
    /// A run starting from a new idea.
    pub fn new(idea: impl Into<String>) -> Self {
        Self {
            idea: idea.into(),
            ..Self::default()
        }
    }

    /// A run rebuilding an existing codebase.
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    pub fn with_tech_stack(mut self, tech_stack: impl Into<String>) -> Self {
        self.tech_stack = Some(tech_stack.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Chronicle session label: the idea, or the source when no idea is given.
    fn session_label(&self) -> String {
        let basis = match (&self.source, self.idea.trim().is_empty()) {
            (Some(source), true) => source.as_str(),
            _ => self.idea.as_str(),
        };
        slug_label(basis, SESSION_LABEL_CHARS)
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Statistics about runs executed by one orchestrator.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total number of runs that reached a terminal status.
    pub total_runs: u64,
    pub successful: u64,
    pub failed_qa: u64,
    pub failed: u64,
    /// Average wall-clock duration of a run.
    pub average_duration: Duration,
}

impl PipelineStats {
    /// Creates new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, status: RunStatus, duration: Duration) {
        self.total_runs += 1;
        match status {
            RunStatus::Success => self.successful += 1,
            RunStatus::FailedQa => self.failed_qa += 1,
            RunStatus::Failed => self.failed += 1,
            RunStatus::Running => {}
        }
        self.update_average_duration(duration);
    }

    /// Updates the running average duration.
    fn update_average_duration(&mut self, duration: Duration) {
        if self.total_runs == 1 {
            self.average_duration = duration;
        } else {
            // Incremental average: avg = avg + (new - avg) / n
            let n = self.total_runs as f64;
            let old_avg = self.average_duration.as_secs_f64();
            let new_val = duration.as_secs_f64();
            let new_avg = old_avg + (new_val - old_avg) / n;
            self.average_duration = Duration::from_secs_f64(new_avg.max(0.0));
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// How the stage sequence ended when no stage failed.
enum Outcome {
    Deployed,
    GateFailed,
}

/// Why the stage sequence stopped early.
enum Halt {
    Stage(AgentError),
    Chronicle(ChronicleError),
}

impl From<AgentError> for Halt {
    fn from(error: AgentError) -> Self {
        Halt::Stage(error)
    }
}

impl From<ChronicleError> for Halt {
    fn from(error: ChronicleError) -> Self {
        Halt::Chronicle(error)
    }
}

/// Drives the stage sequence, recording every step in the Chronicle.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    agents: AgentSet,
    chronicle: Arc<ChronicleRecorder>,
    runs: RunStore,
    stats: RwLock<PipelineStats>,
}

impl fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("config", &self.config)
            .field("agents", &self.agents)
            .field("runs", &self.runs)
            .finish_non_exhaustive()
    }
}

impl PipelineOrchestrator {
    /// Creates an orchestrator over explicit collaborators and recorder.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the configuration is invalid.
    pub fn new(
        config: PipelineConfig,
        agents: AgentSet,
        chronicle: Arc<ChronicleRecorder>,
    ) -> PipelineResult<Self> {
        config.validate()?;
        let runs = RunStore::new(config.data_dir.clone());
        Ok(Self {
            config,
            agents,
            chronicle,
            runs,
            stats: RwLock::new(PipelineStats::new()),
        })
    }

    /// Creates an orchestrator using the built-in agents and a fresh recorder.
    pub fn with_builtin_agents(config: PipelineConfig) -> PipelineResult<Self> {
        let agents = AgentSet::builtin(config.projects_dir.clone());
        let chronicle = Arc::new(ChronicleRecorder::new(config.chronicle.clone()));
        Self::new(config, agents, chronicle)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn chronicle(&self) -> &Arc<ChronicleRecorder> {
        &self.chronicle
    }

    pub fn runs(&self) -> &RunStore {
        &self.runs
    }

    /// Returns a snapshot of the run statistics.
    pub async fn stats(&self) -> PipelineStats {
        self.stats.read().await.clone()
    }

    /// Runs the full pipeline for one request.
    ///
    /// Stage failures and quality gate failures do not produce an `Err`: they
    /// are reported through the returned record's `status`. The record is
    /// written to the data directory on every path.
    ///
    /// # Errors
    ///
    /// - `PipelineError::Chronicle` if the Chronicle could not be written
    /// - `PipelineError::Persistence` if the run record could not be written
    pub async fn run_full_pipeline(&self, request: PipelineRequest) -> PipelineResult<PipelineRun> {
        let start_time = Instant::now();
        let mut run = PipelineRun::start();

        let session_id = self
            .chronicle
            .start_session(&request.session_label(), PIPELINE_TRIGGER)
            .await?;
        info!(
            pipeline_id = %run.pipeline_id,
            session_id = %session_id,
            "Pipeline run started"
        );

        let outcome = self.drive(&request, &mut run).await;
        let closed = self.close(&mut run, outcome).await;
        let saved = self.runs.save(&run).await;

        self.stats.write().await.record(run.status, start_time.elapsed());

        closed?;
        let path = saved?;
        info!(
            pipeline_id = %run.pipeline_id,
            status = %run.status,
            record = %path.display(),
            "Pipeline run finished"
        );

        Ok(run)
    }

    /// Records the terminal status and closes the Chronicle session.
    async fn close(&self, run: &mut PipelineRun, outcome: Result<Outcome, Halt>) -> PipelineResult<()> {
        let final_status = match outcome {
            Ok(Outcome::Deployed) => {
                run.succeeded();
                RunStatus::Success
            }
            Ok(Outcome::GateFailed) => {
                run.failed_qa();
                RunStatus::FailedQa
            }
            Err(Halt::Stage(error)) => {
                let failure = StageFailure::classify(&error);
                let message = error.to_string();
                warn!(pipeline_id = %run.pipeline_id, failure = %failure, error = %message, "Pipeline stage failed");

                run.failed(failure, message.as_str());
                self.chronicle
                    .record_issue("pipeline", failure.issue_type(), &message, None)?;
                RunStatus::Failed
            }
            Err(Halt::Chronicle(error)) => {
                run.failed(StageFailure::Exception, error.to_string());
                // The session must not outlive the run.
                match self.chronicle.end_session(&RunStatus::Failed.to_string()).await {
                    Ok(report) => run.chronicle = Some(report),
                    Err(close_error) => warn!(
                        pipeline_id = %run.pipeline_id,
                        error = %close_error,
                        "Failed to close chronicle session after recording error"
                    ),
                }
                return Err(error.into());
            }
        };

        let report = self.chronicle.end_session(&final_status.to_string()).await?;
        run.chronicle = Some(report);
        Ok(())
    }

    /// Runs one agent call under the stage timeout, measuring its duration.
    async fn timed<T, F>(&self, stage: PipelineStage, call: F) -> AgentResult<(T, u64)>
    where
        F: Future<Output = AgentResult<T>>,
    {
        info!(stage = %stage, "Stage started");
        let started = Instant::now();
        let result = tokio::time::timeout(self.config.stage_timeout, call)
            .await
            .map_err(|_| AgentError::Timeout {
                seconds: self.config.stage_timeout.as_secs(),
            })?;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        result.map(|value| (value, duration_ms))
    }

    /// Walks the stage sequence. Every stage records action, checkpoint and
    /// handoff, in that order.
    async fn drive(&self, request: &PipelineRequest, run: &mut PipelineRun) -> Result<Outcome, Halt> {
        let chronicle = &self.chronicle;
        let mut idea = request.idea.clone();
        let mut tech_stack = request.tech_stack.clone();
        let mut participants: Vec<String> = Vec::new();

        let pm = self.agents.spec_writer.name();
        let dev = self.agents.developer.name();
        let qa = self.agents.tester.name();
        let deploy = self.agents.deployer.name();

        // Research: rebuild an existing codebase, or study the market.
        let rationale = if let Some(source) = &request.source {
            let agent = self.agents.reverse_engineer.name();
            let (summary, duration_ms) = self
                .timed(
                    PipelineStage::ReverseEngineer,
                    self.agents.reverse_engineer.analyze(source),
                )
                .await?;

            chronicle.record_agent_action(
                agent,
                "analyze_codebase",
                Some(&json!(source)),
                Some(&snapshot(&summary)),
                ActionMetadata::new()
                    .with_duration_ms(duration_ms)
                    .with_field("files_analyzed", summary.file_metrics.total_files),
            )?;
            chronicle.record_checkpoint(
                PipelineStage::ReverseEngineer.checkpoint_name(),
                CheckpointStatus::Success,
                metrics(json!({
                    "files_analyzed": summary.file_metrics.total_files,
                    "lines_of_code": summary.file_metrics.lines_of_code,
                })),
            )?;
            chronicle.record_handoff(
                agent,
                pm,
                "reconstructed_specification",
                &describe_analysis(&summary),
            )?;

            idea = format!("Rebuild and improve: {}", summary.reconstructed_spec.title);
            if tech_stack.is_none() {
                tech_stack = summary.tech_stack_guess.clone();
            }
            participants.push(agent.to_string());
            run.push(StageResult::ReverseEngineer(summary));
            "Based on the reverse-engineered codebase"
        } else {
            let agent = self.agents.market_researcher.name();
            let (summary, duration_ms) = self
                .timed(
                    PipelineStage::MarketResearch,
                    self.agents.market_researcher.research(&idea),
                )
                .await?;

            chronicle.record_agent_action(
                agent,
                "market_research",
                Some(&json!(idea)),
                Some(&snapshot(&summary)),
                ActionMetadata::new()
                    .with_duration_ms(duration_ms)
                    .with_field("competitors_found", summary.competitor_count),
            )?;
            chronicle.record_checkpoint(
                PipelineStage::MarketResearch.checkpoint_name(),
                CheckpointStatus::Success,
                metrics(json!({
                    "competitors_found": summary.competitor_count,
                    "trends_identified": summary.trend_count,
                    "pain_points": summary.pain_point_count,
                })),
            )?;
            chronicle.record_handoff(
                agent,
                pm,
                "market_research_report",
                &format!(
                    "{} competitors, {} pain points",
                    summary.competitor_count, summary.pain_point_count
                ),
            )?;

            participants.push(agent.to_string());
            run.push(StageResult::MarketResearch(summary));
            "Based on market research and technical requirements"
        };

        // Specification
        let (spec, duration_ms) = self
            .timed(
                PipelineStage::Specification,
                self.agents.spec_writer.create(&idea, tech_stack.as_deref()),
            )
            .await?;
        let feature_id = spec.feature_id.clone();
        run.feature_id = Some(feature_id.clone());

        chronicle.record_agent_action(
            pm,
            "create_specification",
            Some(&json!(idea)),
            Some(&snapshot(&spec)),
            ActionMetadata::new()
                .with_duration_ms(duration_ms)
                .with_field("user_stories", spec.user_story_count),
        )?;
        chronicle.record_decision(
            pm,
            &format!("Build with {}", tech_stack.as_deref().unwrap_or("default stack")),
            rationale,
            &["Alternative stacks evaluated"],
        )?;
        chronicle.record_checkpoint(
            PipelineStage::Specification.checkpoint_name(),
            CheckpointStatus::Success,
            spec_metrics(&spec),
        )?;
        chronicle.record_handoff(
            pm,
            dev,
            "feature_specification",
            &format!("{} user stories, API spec, DB schema", spec.user_story_count),
        )?;
        participants.push(pm.to_string());
        run.push(StageResult::Specification(spec));

        // Development
        let (development, duration_ms) = self
            .timed(
                PipelineStage::Development,
                self.agents.developer.develop(&feature_id),
            )
            .await?;

        chronicle.record_agent_action(
            dev,
            "generate_codebase",
            Some(&json!(feature_id)),
            Some(&snapshot(&development)),
            ActionMetadata::new()
                .with_duration_ms(duration_ms)
                .with_field("files_generated", development.files_generated_count),
        )?;
        chronicle.record_checkpoint(
            PipelineStage::Development.checkpoint_name(),
            CheckpointStatus::Success,
            development_metrics(&development),
        )?;
        chronicle.record_handoff(
            dev,
            qa,
            "codebase",
            &format!(
                "{} files in {} + {}",
                development.files_generated_count,
                development.tech_stack_used.frontend,
                development.tech_stack_used.backend
            ),
        )?;
        participants.push(dev.to_string());
        run.push(StageResult::Development(development));

        // Testing and quality gate
        let (testing, duration_ms) = self
            .timed(PipelineStage::Testing, self.agents.tester.test(&feature_id))
            .await?;
        let score = testing.overall_score;
        let gate_passed = score >= self.config.quality_gate_threshold;

        chronicle.record_agent_action(
            qa,
            "test_feature",
            Some(&json!(feature_id)),
            Some(&snapshot(&testing)),
            ActionMetadata::new()
                .with_duration_ms(duration_ms)
                .with_field("score", score),
        )?;
        chronicle.record_checkpoint(
            PipelineStage::Testing.checkpoint_name(),
            testing_checkpoint(&testing, gate_passed),
            metrics(json!({
                "overall_score": score,
                "status": testing.status,
                "quality_gate": self.config.quality_gate_threshold,
            })),
        )?;
        participants.push(qa.to_string());
        run.push(StageResult::Testing(testing));

        if !gate_passed {
            warn!(
                feature_id = %feature_id,
                score,
                threshold = self.config.quality_gate_threshold,
                "Quality gate failed, deployment skipped"
            );
            chronicle.record_issue(
                qa,
                "low_test_score",
                &format!("QA score {}% below threshold", score),
                Some("Pipeline halted for fixes"),
            )?;
            return Ok(Outcome::GateFailed);
        }

        chronicle.record_handoff(
            qa,
            deploy,
            "test_report",
            &format!("Score {}%, quality gate passed", score),
        )?;

        // Deployment
        let environment = request
            .environment
            .as_deref()
            .unwrap_or(&self.config.default_environment);
        let platform = request
            .platform
            .as_deref()
            .unwrap_or(&self.config.default_platform);
        let (deployment, duration_ms) = self
            .timed(
                PipelineStage::Deployment,
                self.agents.deployer.deploy(&feature_id, environment, platform),
            )
            .await?;

        chronicle.record_agent_action(
            deploy,
            "deploy_application",
            Some(&json!(feature_id)),
            Some(&snapshot(&deployment)),
            ActionMetadata::new()
                .with_duration_ms(duration_ms)
                .with_field("environment", environment)
                .with_field("platform", platform),
        )?;
        chronicle.record_checkpoint(
            PipelineStage::Deployment.checkpoint_name(),
            CheckpointStatus::Success,
            metrics(json!({
                "deployment_id": deployment.deployment_id,
                "status": deployment.status,
            })),
        )?;
        chronicle.record_handoff(
            deploy,
            END_USER,
            "deployed_application",
            &format!("Available at {}", primary_url(&deployment)),
        )?;
        participants.push(deploy.to_string());
        run.push(StageResult::Deployment(deployment));

        let agents: Vec<&str> = participants.iter().map(String::as_str).collect();
        chronicle.record_collaboration(
            &agents,
            "Full pipeline execution",
            &format!("Successfully built and deployed {}", feature_id),
        )?;

        Ok(Outcome::Deployed)
    }

    // ========================================================================
    // Single-stage entry points
    // ========================================================================

    /// Reverse engineers a codebase without opening a Chronicle session.
    pub async fn reverse_engineer(&self, source: &str) -> AgentResult<ReverseEngineerSummary> {
        self.timed(
            PipelineStage::ReverseEngineer,
            self.agents.reverse_engineer.analyze(source),
        )
        .await
        .map(|(summary, _)| summary)
    }

    /// Creates a feature specification.
    pub async fn create_spec(&self, idea: &str, tech_stack: Option<&str>) -> AgentResult<SpecSummary> {
        self.timed(
            PipelineStage::Specification,
            self.agents.spec_writer.create(idea, tech_stack),
        )
        .await
        .map(|(summary, _)| summary)
    }

    /// Generates the codebase of an existing feature.
    pub async fn develop(&self, feature_id: &str) -> AgentResult<DevelopmentSummary> {
        self.timed(
            PipelineStage::Development,
            self.agents.developer.develop(feature_id),
        )
        .await
        .map(|(summary, _)| summary)
    }

    /// Tests an existing feature.
    pub async fn test(&self, feature_id: &str) -> AgentResult<TestSummary> {
        self.timed(PipelineStage::Testing, self.agents.tester.test(feature_id))
            .await
            .map(|(summary, _)| summary)
    }

    /// Deploys an existing feature, falling back to the configured target.
    pub async fn deploy(
        &self,
        feature_id: &str,
        environment: Option<&str>,
        platform: Option<&str>,
    ) -> AgentResult<DeploymentSummary> {
        let environment = environment.unwrap_or(&self.config.default_environment);
        let platform = platform.unwrap_or(&self.config.default_platform);
        self.timed(
            PipelineStage::Deployment,
            self.agents.deployer.deploy(feature_id, environment, platform),
        )
        .await
        .map(|(summary, _)| summary)
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

/// Serializes a stage summary for the Chronicle's input/output summaries.
fn snapshot<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn metrics(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn spec_metrics(spec: &SpecSummary) -> Option<Map<String, Value>> {
    metrics(json!({
        "feature_id": spec.feature_id,
        "user_stories": spec.user_story_count,
        "acceptance_criteria": spec.acceptance_criteria_count,
    }))
}

fn development_metrics(development: &DevelopmentSummary) -> Option<Map<String, Value>> {
    metrics(json!({
        "files_generated": development.files_generated_count,
        "frontend": development.tech_stack_used.frontend,
        "backend": development.tech_stack_used.backend,
    }))
}

fn describe_analysis(summary: &ReverseEngineerSummary) -> String {
    format!(
        "{} files analyzed, stack: {}",
        summary.file_metrics.total_files,
        summary.tech_stack_guess.as_deref().unwrap_or("unknown")
    )
}

fn testing_checkpoint(testing: &TestSummary, gate_passed: bool) -> CheckpointStatus {
    match (gate_passed, testing.status) {
        (false, _) => CheckpointStatus::Failure,
        (true, TestStatus::Passed) => CheckpointStatus::Success,
        (true, _) => CheckpointStatus::Warning,
    }
}

/// The application url if the platform exposes one, else any url.
fn primary_url(deployment: &DeploymentSummary) -> &str {
    deployment
        .urls
        .get("application")
        .or_else(|| deployment.urls.values().next())
        .map(String::as_str)
        .unwrap_or("local")
}
