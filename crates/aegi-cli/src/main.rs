// aegi-cli/src/main.rs
// ============================================================================
// Module: AEGI CLI
// Description: Thin command-line binary driving a single case pipeline run
//              against in-memory backends, plus config inspection commands.
// Purpose: Give an operator a way to smoke-test the pipeline and inspect
//          `aegi.toml` without standing up a long-running service.
// Dependencies: aegi-core, aegi-config, aegi-orchestrator, aegi-llm,
//               aegi-bus, clap, tokio
// ============================================================================

//! ## Overview
//! `aegi` has two command groups. `run` seeds a [`CaseState`] from one or
//! more text documents, wires in-memory stores and a
//! [`RuleBasedLlmClient`](aegi_llm::RuleBasedLlmClient) (or an HTTP-backed
//! one, with `--llm http`), and walks the full 13-stage pipeline once,
//! printing a per-stage summary and the generated report. `config` wraps
//! `aegi-config`'s loader, validator, schema, and docs generators. Nothing
//! here touches a durable store; that is `aegi-store-sqlite`'s job, wired
//! in by whatever longer-lived service embeds these same crates.

use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use aegi_bus::EventBus;
use aegi_config::AegiConfig;
use aegi_core::BudgetContext;
use aegi_core::ids::ArtifactVersionUid;
use aegi_core::ids::CaseUid;
use aegi_core::ids::ChunkUid;
use aegi_core::ids::OntologyVersionUid;
use aegi_core::model::AnchorHealth;
use aegi_core::model::Chunk;
use aegi_core::model::OntologyVersion;
use aegi_core::runtime::InMemoryEvidenceStore;
use aegi_core::runtime::InMemoryGraphStore;
use aegi_core::runtime::InMemoryVectorStore;
use aegi_core::runtime::StderrAuditSink;
use aegi_core::time::Timestamp;
use aegi_llm::HttpLlmClient;
use aegi_llm::HttpLlmClientConfig;
use aegi_llm::RuleBasedLlmClient;
use aegi_orchestrator::CaseState;
use aegi_orchestrator::PipelineRunner;
use aegi_orchestrator::StageContext;
use aegi_orchestrator::StageStatus;
use aegi_orchestrator::pipeline::PipelineConfig;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Surface
// ============================================================================

/// AEGI Core command-line interface.
#[derive(Parser, Debug)]
#[command(name = "aegi", version, about = "Run an AEGI Core case pipeline locally")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Top-level command groups.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs the full case pipeline once against in-memory backends.
    Run(RunCommand),
    /// Inspects or validates `aegi.toml` configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `aegi run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Case title used in the generated report.
    #[arg(long, default_value = "cli-case")]
    case: String,
    /// Text document to ingest as a chunk. May be repeated.
    #[arg(long = "document", value_name = "PATH")]
    documents: Vec<PathBuf>,
    /// Path to `aegi.toml`. Defaults to the standard resolution order.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// LLM backend used for claim extraction, causal analysis, and the
    /// report/chat renderers.
    #[arg(long, value_enum, default_value_t = LlmBackend::RuleBased)]
    llm: LlmBackend,
    /// Endpoint URL for `--llm http`.
    #[arg(long, value_name = "URL")]
    llm_endpoint: Option<String>,
    /// API key for `--llm http`.
    #[arg(long, value_name = "KEY", default_value = "")]
    llm_api_key: String,
    /// Print the full generated report as JSON instead of a summary.
    #[arg(long)]
    json: bool,
}

/// LLM backend selection for `aegi run`.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LlmBackend {
    /// Deterministic, offline rule-based client.
    RuleBased,
    /// HTTP-backed client against a configured provider endpoint.
    Http,
}

/// Config inspection and validation subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Loads and validates `aegi.toml`, reporting any error.
    Validate(ConfigPathCommand),
    /// Prints a canonical example `aegi.toml`.
    Example,
    /// Prints the configuration JSON schema.
    Schema,
    /// Prints generated configuration reference documentation.
    Docs,
}

/// Shared arguments for config subcommands that accept an explicit path.
#[derive(Args, Debug)]
struct ConfigPathCommand {
    /// Path to `aegi.toml`. Defaults to the standard resolution order.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        write_stdout_line("Usage: aegi <run|config> ...")?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Run(command) => command_run(command).await,
        Commands::Config { command } => command_config(command),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes one end-to-end pipeline run.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let config = AegiConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config error: {err}")))?;

    let case_uid = CaseUid::mint();
    let chunks = load_chunks(&case_uid, &command.documents)?;

    let llm: Arc<dyn aegi_core::LlmClient> = match command.llm {
        LlmBackend::RuleBased => Arc::new(RuleBasedLlmClient::new()),
        LlmBackend::Http => {
            let endpoint_url = command
                .llm_endpoint
                .ok_or_else(|| CliError::new("--llm-endpoint is required for --llm http"))?;
            let http_config = HttpLlmClientConfig {
                endpoint_url,
                api_key: command.llm_api_key,
                ..HttpLlmClientConfig::default()
            };
            Arc::new(
                HttpLlmClient::new(http_config)
                    .map_err(|err| CliError::new(format!("llm client error: {err}")))?,
            )
        }
    };

    let audit = Arc::new(StderrAuditSink);
    let bus = Arc::new(EventBus::new(audit.clone()));
    let evidence_store = Arc::new(InMemoryEvidenceStore::default());
    let graph_store = Arc::new(InMemoryGraphStore::default());
    let vector_store = Arc::new(InMemoryVectorStore::default());

    let ontology = empty_ontology();
    let budget = BudgetContext {
        deadline: std::time::Duration::from_secs(config.orchestrator.task_timeout_seconds),
        max_output_tokens: 2048,
    };

    let ctx = StageContext::new(
        case_uid.clone(),
        llm,
        evidence_store,
        graph_store,
        vector_store,
        audit,
        bus,
        ontology,
        budget,
        PipelineConfig::default(),
        CaseState::with_pending_chunks(chunks),
    );

    let results = PipelineRunner::run(&ctx)
        .await
        .map_err(|err| CliError::new(format!("pipeline error: {err}")))?;

    if command.json {
        let state = ctx.state.lock().map_err(|_| CliError::new("case state lock poisoned"))?;
        let report = state.report.clone();
        let payload = serde_json::to_string_pretty(&report)
            .map_err(|err| CliError::new(format!("report encoding error: {err}")))?;
        write_stdout_line(&payload)?;
        drop(state);
    } else {
        print_summary(&command.case, &case_uid, &results, &ctx)?;
    }

    let failed = results.iter().any(|result| result.status == StageStatus::Error);
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Loads each document path as one pipeline chunk. Each document becomes
/// its own synthetic artifact version, since the CLI has no multi-document
/// artifact grouping concept of its own.
fn load_chunks(case_uid: &CaseUid, paths: &[PathBuf]) -> CliResult<Vec<Chunk>> {
    paths
        .iter()
        .enumerate()
        .map(|(ordinal, path)| {
            let text = std::fs::read_to_string(path)
                .map_err(|err| CliError::new(format!("failed to read {}: {err}", path.display())))?;
            Ok(Chunk {
                uid: ChunkUid::mint(),
                case_uid: case_uid.clone(),
                artifact_version_uid: ArtifactVersionUid::mint(),
                ordinal: u32::try_from(ordinal).unwrap_or(u32::MAX),
                text,
                anchors: Vec::new(),
                anchor_health: AnchorHealth::Unchecked,
                created_at: Timestamp::new(time::OffsetDateTime::now_utc()),
            })
        })
        .collect()
}

/// Builds an empty starter ontology. A real deployment registers its
/// entity/relation types through [`aegi_ontology::OntologyRegistry`] before
/// a case ever runs; the CLI's single-shot smoke test has nothing to
/// register against, so `kg_build` simply has no types to validate against.
fn empty_ontology() -> OntologyVersion {
    OntologyVersion {
        uid: OntologyVersionUid::mint(),
        version: 0,
        types: Vec::new(),
        created_at: Timestamp::new(time::OffsetDateTime::now_utc()),
    }
}

/// Prints a human-readable per-stage summary followed by report section
/// titles.
fn print_summary(
    case: &str,
    case_uid: &CaseUid,
    results: &[aegi_orchestrator::StageResult],
    ctx: &StageContext,
) -> CliResult<()> {
    write_stdout_line(&format!("case: {case} ({case_uid})"))?;
    for result in results {
        let marker = match result.status {
            StageStatus::Success => "ok",
            StageStatus::Skipped => "skip",
            StageStatus::Error => "error",
        };
        let mut line = format!("  {:<20} {:<6} {}ms", result.stage.as_str(), marker, result.duration_ms);
        if let Some(error) = &result.error {
            line.push_str(&format!(" ({error})"));
        }
        write_stdout_line(&line)?;
    }

    let state = ctx.state.lock().map_err(|_| CliError::new("case state lock poisoned"))?;
    write_stdout_line(&format!(
        "chunks: {} claims: {} hypotheses: {} forecasts: {}",
        state.chunks.len(),
        state.source_claims.len(),
        state.hypotheses.len(),
        state.forecasts.len(),
    ))?;
    if let Some(report) = &state.report {
        write_stdout_line(&format!("report: {} ({} sections)", report.title, report.sections.len()))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => command_config_example(),
        ConfigCommand::Schema => command_config_schema(),
        ConfigCommand::Docs => command_config_docs(),
    }
}

/// Executes `config validate`.
fn command_config_validate(command: &ConfigPathCommand) -> CliResult<ExitCode> {
    AegiConfig::load(command.config.as_deref()).map_err(|err| CliError::new(format!("invalid config: {err}")))?;
    write_stdout_line("config ok")?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `config example`.
fn command_config_example() -> CliResult<ExitCode> {
    write_stdout_line(aegi_config::config_toml_example().trim_end())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `config schema`.
fn command_config_schema() -> CliResult<ExitCode> {
    let schema = aegi_config::config_schema();
    let payload = serde_json::to_string_pretty(&schema)
        .map_err(|err| CliError::new(format!("schema encoding error: {err}")))?;
    write_stdout_line(&payload)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `config docs`.
fn command_config_docs() -> CliResult<ExitCode> {
    let docs = aegi_config::config_docs_markdown().map_err(|err| CliError::new(format!("docs error: {err}")))?;
    write_stdout_line(docs.trim_end())?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::new(format!("stdout write failed: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(&format!("error: {message}"));
    ExitCode::FAILURE
}
