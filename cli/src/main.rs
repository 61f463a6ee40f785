//! CLI entrypoint for Agent Council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use council_application::{
    AgentInvoker, CouncilEngine, CouncilOutcome, EngineError, NoProgress, PersistenceGateway,
    ProgressNotifier,
};
use council_domain::{AgentSpec, Council, OutputFormat, PhaseKind, SessionId};
use council_infrastructure::{
    ConfigLoader, DryRunInvoker, FileConfig, InMemoryPersistence, InvokerKind,
    JsonFilePersistence, JsonlConversationLogger, LocalContextLoader, StorageKind,
};
use council_presentation::{Cli, ConsoleFormatter, CouncilReport, ForcePhase, ProgressReporter};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        println!("Configuration sources (lowest to highest priority):");
        for source in ConfigLoader::describe_sources() {
            println!("  {}", source);
        }
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    config.validate().context("Invalid configuration")?;

    let _log_guard = init_logging(cli.verbose, &config);
    info!("Starting Agent Council");

    if !config.output.color {
        colored::control::set_override(false);
    }

    let engine = build_engine(&cli, &config)?;

    if cli.list_sessions {
        print_sessions(&engine).await?;
        return Ok(());
    }

    // === Session ===
    let session_id = match &cli.session {
        Some(id) => {
            if cli.question.is_some() {
                warn!("Ignoring question: continuing session {}", id);
            }
            let id = SessionId::new(id.as_str());
            engine.open_session(&id).await?;
            id
        }
        None => {
            let question = match &cli.question {
                Some(q) => q,
                None => bail!("Question is required. Use --session to continue a session."),
            };
            let documents = LocalContextLoader::new().load_all(&cli.context)?;
            engine.create_session(question, documents).await?
        }
    };

    // === Council ===
    let has_council = engine.session_state(&session_id).await?.council.is_some();
    match &cli.council {
        Some(path) => {
            let council = ConfigLoader::load_council(path)
                .map_err(|e| anyhow!("Failed to load council from {}: {}", path.display(), e))?
                .to_council()
                .with_context(|| format!("Council file {} has no agents", path.display()))?;
            let outcome = if has_council {
                let force = cli.force == Some(ForcePhase::Execute);
                engine.edit_council(&session_id, council, force).await?
            } else {
                engine.install_council(&session_id, council, false).await?
            };
            if let CouncilOutcome::Applied { invalidated } = outcome
                && !invalidated.is_empty()
            {
                info!("Council change invalidated {:?}", invalidated);
            }
        }
        None if !has_council => {
            let council = config.council.to_council().unwrap_or_else(default_council);
            engine.install_council(&session_id, council, false).await?;
        }
        None => {}
    }

    if !cli.quiet {
        eprintln!("Session: {}", session_id);
    }

    // === Phases ===
    let pipeline = run_pipeline(&engine, &session_id, cli.force).await;

    let report = CouncilReport::collect(&engine, &session_id).await?;
    let format = cli
        .output
        .map(OutputFormat::from)
        .or(config.output.format)
        .unwrap_or_default();
    let output = match format {
        OutputFormat::Full => ConsoleFormatter::format(&report),
        OutputFormat::Verdict => ConsoleFormatter::format_verdict_only(&report),
        OutputFormat::Json => ConsoleFormatter::format_json(&report),
    };
    println!("{}", output);

    pipeline.map_err(Into::into)
}

fn init_logging(verbose: u8, config: &FileConfig) -> Option<WorkerGuard> {
    // Initialize logging based on verbosity level
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let (file_layer, guard) = match &config.logging.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "agent-council.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

fn build_engine(cli: &Cli, config: &FileConfig) -> Result<CouncilEngine> {
    // === Dependency Injection ===
    let invoker: Arc<dyn AgentInvoker> = if cli.dry_run || config.invoker.kind == InvokerKind::DryRun
    {
        info!("Using dry-run invoker");
        Arc::new(DryRunInvoker::new(config.invoker.model.as_str()))
    } else {
        responses_invoker(config)?
    };

    let persistence: Arc<dyn PersistenceGateway> = match config.storage.kind {
        StorageKind::Memory => Arc::new(InMemoryPersistence::new()),
        StorageKind::File => {
            let dir = config
                .storage
                .directory
                .clone()
                .context("storage.directory is required for file storage")?;
            Arc::new(JsonFilePersistence::new(dir))
        }
    };

    let mut engine_config = config.engine_config();
    if let Some(max) = cli.max_concurrency {
        if max == 0 {
            bail!("--max-concurrency must be greater than 0");
        }
        engine_config = engine_config.with_max_concurrency(Some(max));
    }

    let progress: Arc<dyn ProgressNotifier> = if cli.quiet {
        Arc::new(NoProgress)
    } else {
        Arc::new(ProgressReporter::new())
    };

    let mut engine = CouncilEngine::new(invoker, persistence, engine_config).with_progress(progress);

    if let Some(path) = &config.logging.conversation_log {
        match JsonlConversationLogger::new(path) {
            Some(logger) => engine = engine.with_conversation_logger(Arc::new(logger)),
            None => warn!("Conversation log disabled: cannot open {}", path.display()),
        }
    }

    Ok(engine)
}

#[cfg(feature = "http")]
fn responses_invoker(config: &FileConfig) -> Result<Arc<dyn AgentInvoker>> {
    let invoker = council_infrastructure::ResponsesInvoker::from_env(
        config.invoker.base_url.as_str(),
        &config.invoker.api_key_env,
        config.invoker.model.as_str(),
        config
            .invoker
            .request_timeout_seconds
            .map(std::time::Duration::from_secs),
    )?;
    Ok(Arc::new(invoker))
}

#[cfg(not(feature = "http"))]
fn responses_invoker(_config: &FileConfig) -> Result<Arc<dyn AgentInvoker>> {
    bail!("Built without the `http` feature; use --dry-run or invoker.kind = \"dry_run\"")
}

/// Execute, review and synthesize in order, forcing at most one phase
async fn run_pipeline(
    engine: &CouncilEngine,
    id: &SessionId,
    force: Option<ForcePhase>,
) -> Result<(), EngineError> {
    for (phase, forced) in [
        (PhaseKind::Execute, ForcePhase::Execute),
        (PhaseKind::Review, ForcePhase::Review),
        (PhaseKind::Synthesize, ForcePhase::Synthesize),
    ] {
        run_phase(engine, id, phase, force == Some(forced)).await?;
    }
    Ok(())
}

async fn run_phase(
    engine: &CouncilEngine,
    id: &SessionId,
    phase: PhaseKind,
    force: bool,
) -> Result<(), EngineError> {
    let outcome = match phase {
        PhaseKind::Execute => engine.start_execute(id, force).await?,
        PhaseKind::Review => engine.start_review(id, force).await?,
        _ => engine.start_synthesize(id, force).await?,
    };

    let Some(ticket) = outcome.into_ticket() else {
        info!("{} already done; using stored results", phase);
        return Ok(());
    };

    let wait = ticket.wait();
    tokio::pin!(wait);
    let report = tokio::select! {
        report = &mut wait => report?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; cancelling {}", phase);
            engine.cancel(id).await?;
            wait.await?
        }
    };

    info!(
        "{} finished: {} succeeded, {} failed",
        phase, report.succeeded, report.failed
    );
    Ok(())
}

async fn print_sessions(engine: &CouncilEngine) -> Result<()> {
    let sessions = engine.list_sessions().await?;
    if sessions.is_empty() {
        println!("No stored sessions.");
        return Ok(());
    }
    for session in sessions {
        println!(
            "{}  {:<12} {:>8} tokens  ${:.4}  {}",
            session.id,
            session.phase.as_str(),
            session.total_tokens,
            session.total_cost_usd,
            session.question.lines().next().unwrap_or_default()
        );
    }
    Ok(())
}

/// Council used when neither a council file nor `[council]` is configured
fn default_council() -> Council {
    Council::new(
        "default",
        vec![
            AgentSpec::new(
                "Pragmatist",
                "A senior engineer who favours the simplest option that works today \
                 and weighs delivery cost above elegance.",
            ),
            AgentSpec::new(
                "Skeptic",
                "A reviewer who looks for failure modes, hidden assumptions and \
                 missing evidence before agreeing to anything.",
            ),
            AgentSpec::new(
                "Strategist",
                "A product lead who judges options by their long-term consequences \
                 for users and the team.",
            ),
        ],
    )
}
