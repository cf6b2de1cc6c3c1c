//! CLI - Command Line Interface
//!
//! Available Commands:
//! - citelens tui               - interactive terminal chat (default)
//! - citelens ask -m "question" - one-shot question, answer printed to stdout
//! - citelens health            - check the backend

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use citelens_core::{CiteLensConfig, ConfigError, QueryRequest};
use citelens_tui::{ChatSession, DynQueryBackend, ViewState, run_tui};

use crate::logging::{LogTarget, default_log_file, init_logging};
use crate::query_client::{BackendError, QueryClient};

/// CLI Errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("backend unhealthy: {0}")]
    Unhealthy(String),
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

/// citelens CLI
#[derive(Parser, Debug)]
#[command(name = "citelens")]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Config file (default: ./citelens.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides config and environment
    #[arg(short = 'u', long, global = true)]
    url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub(crate) enum Commands {
    /// Start the interactive terminal UI
    Tui,

    /// Ask one question and print the answer
    Ask(AskArgs),

    /// Check backend health
    Health,
}

#[derive(Args, Debug, PartialEq)]
pub(crate) struct AskArgs {
    /// Question to send
    #[arg(short = 'm', long)]
    pub message: String,

    /// Rows requested per retrieval path (1-6)
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Leave result tables out of the printed answer
    #[arg(long)]
    pub no_tables: bool,
}

/// Run the CLI
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    let mut config = CiteLensConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.url {
        config.backend.base_url = url.clone();
    }
    let output = cli.output.unwrap_or(OutputFormat::Pretty);
    let command = cli.command.unwrap_or(Commands::Tui);

    let target = log_target(&command, cli.verbose, &config);
    init_logging(&target, config.log.level.as_deref())?;
    info!(backend = config.backend_url(), "citelens starting");

    let client = QueryClient::from_config(&config)?;
    match command {
        Commands::Tui => run_interactive(client, &config).await,
        Commands::Ask(args) => run_ask(&client, &config, &args, output).await,
        Commands::Health => run_health(&client, output).await,
    }
}

fn log_target(command: &Commands, verbose: bool, config: &CiteLensConfig) -> LogTarget {
    match command {
        Commands::Tui => LogTarget::File(config.log.file.clone().unwrap_or_else(default_log_file)),
        _ if verbose => LogTarget::Stderr,
        _ => LogTarget::Off,
    }
}

async fn run_interactive(client: QueryClient, config: &CiteLensConfig) -> Result<(), CliError> {
    let backend: DynQueryBackend = Arc::new(client);
    let mut session = ChatSession::new(config.backend.limit_results);
    let mut view = ViewState::from_config(&config.ui);
    run_tui(&mut session, backend, &mut view).await?;
    Ok(())
}

async fn run_ask(
    client: &QueryClient,
    config: &CiteLensConfig,
    args: &AskArgs,
    output: OutputFormat,
) -> Result<(), CliError> {
    let limit = args.limit.unwrap_or(config.backend.limit_results);

    if output == OutputFormat::Json {
        let request = QueryRequest::new(args.message.trim()).with_limit(limit);
        let raw = client.query_raw(&request).await?;
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }

    let mut session = ChatSession::new(limit);
    if !session.ask(client, &args.message).await {
        return Err(CliError::Query("empty question".to_string()));
    }
    let show_tables = config.ui.show_tables && !args.no_tables;
    for line in ask_output(&session, show_tables) {
        println!("{line}");
    }
    match session.error() {
        Some(error) => Err(CliError::Query(error.to_string())),
        None => Ok(()),
    }
}

/// Plain-text transcript followed by the deduplicated sources.
fn ask_output(session: &ChatSession, show_tables: bool) -> Vec<String> {
    let mut lines = session.render(show_tables).plain_lines();
    let summaries = session.source_summaries();
    if !summaries.is_empty() {
        lines.push(String::new());
        lines.push(format!("Sources ({})", summaries.len()));
        for (i, summary) in summaries.iter().enumerate() {
            let mut line = format!("  {}. {} — {}", i + 1, summary.title, summary.description);
            if !summary.details.is_empty() {
                line.push_str(&format!(" ({})", summary.details));
            }
            lines.push(line);
        }
    }
    lines
}

async fn run_health(client: &QueryClient, output: OutputFormat) -> Result<(), CliError> {
    let health = client.health().await?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&health)?),
        OutputFormat::Pretty => {
            println!("backend:   {}", client.base_url());
            println!("status:    {}", health.status);
            println!("version:   {}", health.version.as_deref().unwrap_or("-"));
            println!("timestamp: {}", health.timestamp.as_deref().unwrap_or("-"));
        }
    }
    if health.is_healthy() {
        Ok(())
    } else {
        Err(CliError::Unhealthy(health.status))
    }
}
