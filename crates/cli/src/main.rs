//! EduRAG CLI
//!
//! Main entry point for the edurag command-line tool.
//! Answers research questions from a growing knowledge base of reports.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{AskCommand, RepairCommand, StatsCommand};
use edurag_core::{
    config::AppConfig,
    logging::{self, LogFormat},
};
use std::path::PathBuf;

/// EduRAG - grounded answers for educational research questions
#[derive(Parser, Debug)]
#[command(name = "edurag")]
#[command(about = "Grounded answers for educational research questions", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "EDURAG_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "EDURAG_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Generation provider (gemini, mock)
    #[arg(short, long, global = true, env = "EDURAG_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "EDURAG_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a research question
    Ask(AskCommand),

    /// Backfill missing document vectors
    Repair(RepairCommand),

    /// Show knowledge base statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Paths are resolved before loading so the selected YAML is the one merged
    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init_logging(config.log_level.as_deref(), config.no_color, format)?;

    tracing::info!("EduRAG CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.validate()?;
    config.ensure_edurag_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Repair(_) => "repair",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Repair(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
