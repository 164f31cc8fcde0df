//! CLI command definitions for devforge.
//!
//! This module provides the command-line interface for running the full
//! pipeline, invoking single stages against an existing feature and
//! inspecting run records and Chronicle reports.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::agents::AgentResult;
use crate::chronicle::{ActionMetadata, CheckpointStatus, ChronicleRecorder, Report};
use crate::pipeline::{
    PipelineConfig, PipelineOrchestrator, PipelineRequest, PipelineRun, RunStatus,
};

/// Idea recorded by `chronicle demo`.
const DEMO_IDEA: &str = "Todo app with reminders";

/// Feature pipeline: idea to deployed scaffold, with a recorded history.
#[derive(Parser)]
#[command(name = "devforge")]
#[command(about = "Take a feature idea from concept to a deployed scaffold application")]
#[command(version)]
#[command(
    long_about = "devforge runs a feature through market research, specification, development, testing and deployment agents.\n\nEvery run is recorded by the Chronicle, which writes a JSON report and a narrative per session.\n\nExample usage:\n  devforge full \"recipe sharing app\" -t python\n  devforge chronicle list"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Directory for run records (overrides DEVFORGE_DATA_DIR).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory for feature artifacts (overrides DEVFORGE_PROJECTS_DIR).
    #[arg(long, global = true)]
    pub projects_dir: Option<PathBuf>,

    /// Print machine-readable JSON instead of a summary.
    #[arg(short, long, global = true)]
    pub json: bool,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the full pipeline for a new idea.
    Full(FullArgs),

    /// Run the full pipeline rebuilding an existing local codebase.
    Reverse(ReverseArgs),

    /// Create a feature specification.
    #[command(alias = "pm")]
    Spec(SpecArgs),

    /// Generate the codebase of a specified feature.
    Dev(FeatureArgs),

    /// Test the codebase of a developed feature.
    Qa(FeatureArgs),

    /// Deploy a tested feature.
    Deploy(DeployArgs),

    /// List pipeline run records, or show one.
    Runs(RunsArgs),

    /// Inspect Chronicle sessions.
    Chronicle(ChronicleArgs),
}

/// Deployment target shared by commands that deploy.
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    /// Deployment environment (local, staging, production).
    #[arg(short, long)]
    pub environment: Option<String>,

    /// Deployment platform (docker, kubernetes, vercel).
    #[arg(short, long)]
    pub platform: Option<String>,
}

/// Arguments for `devforge full`.
#[derive(Parser, Debug)]
pub struct FullArgs {
    /// The feature idea.
    pub idea: String,

    /// Preferred tech stack, e.g. "python + vue".
    #[arg(short, long)]
    pub tech_stack: Option<String>,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Arguments for `devforge reverse`.
#[derive(Parser, Debug)]
pub struct ReverseArgs {
    /// Path to the local codebase.
    pub source: String,

    /// Preferred tech stack; the detected language when omitted.
    #[arg(short, long)]
    pub tech_stack: Option<String>,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Arguments for `devforge spec`.
#[derive(Parser, Debug)]
pub struct SpecArgs {
    /// The feature idea.
    pub idea: String,

    /// Preferred tech stack.
    #[arg(short, long)]
    pub tech_stack: Option<String>,
}

/// Arguments for single-stage commands addressing a feature.
#[derive(Parser, Debug)]
pub struct FeatureArgs {
    /// Feature id returned by `devforge spec`.
    pub feature_id: String,
}

/// Arguments for `devforge deploy`.
#[derive(Parser, Debug)]
pub struct DeployArgs {
    /// Feature id to deploy.
    pub feature_id: String,

    #[command(flatten)]
    pub target: TargetArgs,
}

/// Arguments for `devforge runs`.
#[derive(Parser, Debug)]
pub struct RunsArgs {
    /// Show the record of this pipeline run.
    pub pipeline_id: Option<String>,
}

/// Chronicle entrypoint arguments.
#[derive(Parser, Debug)]
pub struct ChronicleArgs {
    #[command(subcommand)]
    pub command: ChronicleSubcommand,
}

/// Chronicle subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum ChronicleSubcommand {
    /// Show the report of a session.
    Show {
        /// Session id, as printed by `devforge chronicle list`.
        session_id: String,

        /// Print the narrative instead of the report summary.
        #[arg(long)]
        narrative: bool,
    },

    /// List recorded sessions.
    List,

    /// Record a short scripted session and print its report.
    Demo,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
///
/// This is a convenience function that parses CLI args and runs the command.
/// For more control over logging initialization, use `parse_cli()` and `run_with_cli()`.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
///
/// This is the main entry point for the devforge CLI.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let json = cli.json;

    match cli.command {
        Commands::Full(args) => {
            let request = PipelineRequest {
                idea: args.idea,
                tech_stack: args.tech_stack,
                source: None,
                environment: args.target.environment,
                platform: args.target.platform,
            };
            run_pipeline_command(config, request, json).await
        }
        Commands::Reverse(args) => {
            let request = PipelineRequest {
                idea: String::new(),
                tech_stack: args.tech_stack,
                source: Some(args.source),
                environment: args.target.environment,
                platform: args.target.platform,
            };
            run_pipeline_command(config, request, json).await
        }
        Commands::Spec(args) => {
            let orchestrator = PipelineOrchestrator::with_builtin_agents(config)?;
            let summary = stage(orchestrator.create_spec(&args.idea, args.tech_stack.as_deref()).await)?;
            emit(json, &summary, || {
                println!("Feature {} created: {}", summary.feature_id, summary.title);
                println!(
                    "  {} user stories, {} acceptance criteria",
                    summary.user_story_count, summary.acceptance_criteria_count
                );
            })
        }
        Commands::Dev(args) => {
            let orchestrator = PipelineOrchestrator::with_builtin_agents(config)?;
            let summary = stage(orchestrator.develop(&args.feature_id).await)?;
            emit(json, &summary, || {
                println!(
                    "Generated {} files for {} ({} + {} + {})",
                    summary.files_generated_count,
                    summary.feature_id,
                    summary.tech_stack_used.frontend,
                    summary.tech_stack_used.backend,
                    summary.tech_stack_used.database
                );
            })
        }
        Commands::Qa(args) => {
            let orchestrator = PipelineOrchestrator::with_builtin_agents(config)?;
            let summary = stage(orchestrator.test(&args.feature_id).await)?;
            emit(json, &summary, || {
                println!(
                    "{}: {:.1}% ({})",
                    summary.feature_id, summary.overall_score, summary.status
                );
                for recommendation in &summary.full_report.recommendations {
                    println!("  - {}", recommendation);
                }
            })
        }
        Commands::Deploy(args) => {
            let orchestrator = PipelineOrchestrator::with_builtin_agents(config)?;
            let summary = stage(
                orchestrator
                    .deploy(
                        &args.feature_id,
                        args.target.environment.as_deref(),
                        args.target.platform.as_deref(),
                    )
                    .await,
            )?;
            emit(json, &summary, || {
                println!(
                    "{} {} to {} on {}",
                    summary.feature_id, summary.status, summary.environment, summary.platform
                );
                for (name, url) in &summary.urls {
                    println!("  {}: {}", name, url);
                }
            })
        }
        Commands::Runs(args) => run_runs_command(config, args, json).await,
        Commands::Chronicle(args) => run_chronicle_command(config, args.command, json).await,
    }
}

/// Builds the configuration from the environment, then applies CLI overrides.
fn load_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut config = PipelineConfig::from_env()?;

    if let Some(data_dir) = &cli.data_dir {
        if std::env::var("DEVFORGE_CHRONICLE_DIR").is_err() {
            config.chronicle.output_dir = data_dir.join("chronicle");
        }
        config.data_dir = data_dir.clone();
    }

    if let Some(projects_dir) = &cli.projects_dir {
        config.projects_dir = projects_dir.clone();
    }

    Ok(config)
}

/// Turns a stage error into a CLI error.
fn stage<T>(result: AgentResult<T>) -> anyhow::Result<T> {
    result.map_err(|e| anyhow::anyhow!("{}", e))
}

/// Prints `value` as JSON, or runs the human-readable printer.
fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce()) -> anyhow::Result<()> {
    if json {
        let output = serde_json::to_string_pretty(value)
            .map_err(|e| anyhow::anyhow!("Failed to serialize JSON output: {}", e))?;
        println!("{}", output);
    } else {
        human();
    }
    Ok(())
}

// ============================================================================
// Pipeline Command Implementation
// ============================================================================

async fn run_pipeline_command(
    config: PipelineConfig,
    request: PipelineRequest,
    json: bool,
) -> anyhow::Result<()> {
    let orchestrator = PipelineOrchestrator::with_builtin_agents(config)?;
    let run = orchestrator.run_full_pipeline(request).await?;
    let record = orchestrator.runs().record_path(&run.pipeline_id);

    emit(json, &run, || print_run_summary(&run, &record))?;

    match run.status {
        RunStatus::Success => Ok(()),
        RunStatus::FailedQa => {
            warn!(score = ?run.test_score(), "Fix the reported issues and re-run the pipeline");
            anyhow::bail!("pipeline {} halted by the quality gate", run.pipeline_id)
        }
        _ => anyhow::bail!(
            "pipeline {} failed: {}",
            run.pipeline_id,
            run.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn print_run_summary(run: &PipelineRun, record: &std::path::Path) {
    println!("Pipeline: {}", run.pipeline_id);
    println!("Feature:  {}", run.feature_id.as_deref().unwrap_or("N/A"));
    println!("Status:   {}", run.status.to_string().to_uppercase());
    if let Some(error) = &run.error {
        println!("Error:    {}", error);
    }

    println!();
    println!("Steps:");
    for step in &run.steps {
        println!("  {:<16} {}", step.stage().step_name(), step.headline());
    }

    println!();
    println!("Run record: {}", record.display());
    if let Some(report) = &run.chronicle {
        print_report_summary(report);
    }
}

// ============================================================================
// Runs Command Implementation
// ============================================================================

async fn run_runs_command(config: PipelineConfig, args: RunsArgs, json: bool) -> anyhow::Result<()> {
    let orchestrator = PipelineOrchestrator::with_builtin_agents(config)?;
    let store = orchestrator.runs();

    if let Some(pipeline_id) = args.pipeline_id {
        let run = store.load(&pipeline_id).await?;
        let record = store.record_path(&pipeline_id);
        return emit(json, &run, || print_run_summary(&run, &record));
    }

    let ids = store.list().await?;
    let runs = futures::future::try_join_all(ids.iter().map(|id| store.load(id))).await?;

    let rows: Vec<_> = runs
        .iter()
        .map(|run| {
            json!({
                "pipeline_id": run.pipeline_id,
                "status": run.status,
                "feature_id": run.feature_id,
                "started_at": run.started_at,
            })
        })
        .collect();

    emit(json, &rows, || {
        if runs.is_empty() {
            println!("No pipeline runs in {}", store.data_dir().display());
        }
        for run in &runs {
            println!(
                "{}  {:<9}  {}",
                run.pipeline_id,
                run.status,
                run.feature_id.as_deref().unwrap_or("-")
            );
        }
    })
}

// ============================================================================
// Chronicle Command Implementation
// ============================================================================

async fn run_chronicle_command(
    config: PipelineConfig,
    command: ChronicleSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let recorder = ChronicleRecorder::new(config.chronicle);

    match command {
        ChronicleSubcommand::Show {
            session_id,
            narrative,
        } => {
            if narrative {
                print!("{}", recorder.store().load_narrative(&session_id).await?);
                return Ok(());
            }
            let report = recorder.store().load_report(&session_id).await?;
            emit(json, &report, || print_report_summary(&report))
        }
        ChronicleSubcommand::List => {
            let sessions = recorder.store().list_sessions().await?;
            emit(json, &sessions, || {
                if sessions.is_empty() {
                    println!(
                        "No chronicle sessions in {}",
                        recorder.store().output_dir().display()
                    );
                }
                for session in &sessions {
                    println!("{}", session);
                }
            })
        }
        ChronicleSubcommand::Demo => {
            let report = record_demo_session(&recorder).await?;
            emit(json, &report, || print_report_summary(&report))
        }
    }
}

/// Records a small scripted session covering every event type.
async fn record_demo_session(recorder: &ChronicleRecorder) -> anyhow::Result<Report> {
    let session_id = recorder.start_session("demo_feature", "demo").await?;
    info!(session_id = %session_id, "Recording demo session");

    recorder.record_agent_action(
        "pm",
        "create_specification",
        Some(&json!(DEMO_IDEA)),
        Some(&json!({"feature_id": "feat_demo", "user_stories": 3})),
        ActionMetadata::new().with_duration_ms(1200),
    )?;
    recorder.record_decision(
        "pm",
        "Build with React + Node.js",
        "Team familiarity and ecosystem",
        &["Vue + FastAPI", "Svelte + Go"],
    )?;
    recorder.record_checkpoint(
        "specification",
        CheckpointStatus::Success,
        json!({"user_stories": 3}).as_object().cloned(),
    )?;
    recorder.record_handoff(
        "pm",
        "dev",
        "feature_specification",
        "3 user stories, API spec, DB schema",
    )?;
    recorder.record_collaboration(
        &["pm", "dev"],
        "API contract review",
        "Agreed on REST endpoints",
    )?;
    recorder.record_agent_action(
        "dev",
        "generate_codebase",
        Some(&json!("feat_demo")),
        Some(&json!(["README.md", "backend/src/server.js", "frontend/index.html"])),
        ActionMetadata::new().with_duration_ms(3400),
    )?;
    recorder.record_issue(
        "dev",
        "missing_dependency",
        "Reminder scheduling library not selected",
        Some("Chose a cron-style scheduler"),
    )?;

    Ok(recorder.end_session("success").await?)
}

fn print_report_summary(report: &Report) {
    let summary = &report.summary;
    println!();
    println!("Chronicle: {}", report.session_id);
    println!("  Total events:   {}", summary.total_events);
    println!("  Agents:         {}", summary.total_agents_involved);
    println!("  Handoffs:       {}", summary.total_handoffs);
    println!("  Decisions:      {}", summary.total_decisions);
    println!("  Collaborations: {}", summary.total_collaborations);
    println!("  Issues:         {}", summary.total_issues);
    println!("  Duration:       {:.2}s", summary.duration_seconds);
    for bottleneck in &report.bottlenecks {
        println!("  Bottleneck:     {:?}", bottleneck);
    }
}
