//! `pear` -- CLI binary for pearai-llm.
//!
//! Provides the following subcommands:
//!
//! - `pear chat` -- Stream a reply to one message.
//! - `pear complete` -- Single-shot completion.
//! - `pear model` -- Print the resolved model id and info as JSON.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pearai_llm::ApiProvider;

mod commands;
mod config_loader;

/// Streaming LLM client CLI.
#[derive(Parser)]
#[command(name = "pear", about = "Streaming LLM client CLI", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (overrides auto-discovery).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Provider to use (openai, anthropic, deepseek, pearai).
    #[arg(long, global = true)]
    provider: Option<ApiProvider>,

    /// Model id to request.
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Stream a reply to one message.
    Chat(commands::chat::ChatArgs),

    /// Send a single prompt and print the completion.
    Complete(commands::complete::CompleteArgs),

    /// Print the resolved model id and info as JSON.
    Model,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut options = config_loader::load_options(
        cli.config.as_deref(),
        |k| std::env::var(k).ok(),
        dirs::home_dir(),
    )
    .await?;
    commands::apply_overrides(&mut options, cli.provider, cli.model);

    let handler = commands::build_handler(&options)?;
    match cli.command {
        Commands::Chat(args) => commands::chat::run(handler.as_ref(), args).await?,
        Commands::Complete(args) => commands::complete::run(handler.as_ref(), args).await?,
        Commands::Model => commands::model::run(handler.as_ref()).await?,
    }

    Ok(())
}
