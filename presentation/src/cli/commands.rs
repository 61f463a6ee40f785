//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for council results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Results table, peer reviews and verdict
    Full,
    /// Only the chairman's verdict
    Verdict,
    /// JSON output
    Json,
}

impl From<OutputFormat> for council_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => council_domain::OutputFormat::Full,
            OutputFormat::Verdict => council_domain::OutputFormat::Verdict,
            OutputFormat::Json => council_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for agent-council
#[derive(Parser, Debug)]
#[command(name = "agent-council")]
#[command(author, version, about = "Agent Council - a council of LLM agents answers, cross-reviews and synthesizes")]
#[command(long_about = r#"
Agent Council runs a council of persona-driven agents over one question.

The process has three phases:
1. Execute:    every agent answers the question in parallel
2. Review:     every agent scores and critiques the proposals (1-5)
3. Synthesize: a chairman merges proposals and critiques into a verdict

Configuration files are loaded from (in priority order):
1. COUNCIL_* environment variables (COUNCIL_ENGINE__MAX_CONCURRENCY=4)
2. --config <path>     Explicit config file
3. ./council.toml      Project-level config
4. ~/.config/agent-council/config.toml   Global config

Example:
  agent-council "Should we split the billing service?" --council team.toml
  agent-council "Pick a queue" --context notes.md --context load.csv --output json
  agent-council --session session_20260101_120000_ab12cd --force review
"#)]
pub struct Cli {
    /// The question to ask the council (not needed with --session)
    pub question: Option<String>,

    /// Background document to share with every agent (repeatable)
    #[arg(short, long, value_name = "FILE")]
    pub context: Vec<PathBuf>,

    /// Council definition file (TOML with a name and [[agents]])
    #[arg(long, value_name = "FILE")]
    pub council: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Answer with the offline dry-run invoker instead of calling a model
    #[arg(long)]
    pub dry_run: bool,

    /// Continue an existing session instead of creating one
    #[arg(long, value_name = "ID")]
    pub session: Option<String>,

    /// Re-run a phase (and everything after it) even if it already completed
    #[arg(long, value_enum, value_name = "PHASE")]
    pub force: Option<ForcePhase>,

    /// Maximum number of agents running at once
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,

    /// List stored sessions and exit
    #[arg(long)]
    pub list_sessions: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

/// Phase to force when continuing a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ForcePhase {
    Execute,
    Review,
    Synthesize,
}
