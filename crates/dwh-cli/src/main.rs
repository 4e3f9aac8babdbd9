//! dwh CLI - provision a star-schema warehouse and load it from object storage

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{create_tables, etl, plan};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.global.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match &cli.command {
        cli::Commands::CreateTables => create_tables::execute(&cli.global).await,
        cli::Commands::Etl => etl::execute(&cli.global).await,
        cli::Commands::Plan(args) => plan::execute(args, &cli.global).await,
    }
}
