mod cli;
mod commands;
mod config;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::from_filename(".env.local").ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = config::read_config().context("Failed to read configuration")?;

    match cli.command {
        Commands::Avatar { user_ids, size } => commands::avatar(&settings, &user_ids, size).await,
        Commands::Listen { events } => commands::listen(&settings, &events).await,
    }
}
