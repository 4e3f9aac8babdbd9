//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use dwh_core::config::DEFAULT_CONFIG_FILE;

/// dwh - Provision a Redshift star schema and load it from S3
#[derive(Parser, Debug)]
#[command(name = "dwh")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the warehouse config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drop and recreate every staging, dimension and fact table
    CreateTables,

    /// Bulk-load staging tables, then populate dimensions and facts
    Etl,

    /// Print the statements a driver would run, without connecting
    Plan(PlanArgs),
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Driver to plan
    #[arg(short, long, value_enum, default_value = "load")]
    pub driver: PlanDriver,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: PlanOutput,
}

/// Drivers that can be planned
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanDriver {
    /// DROP and CREATE statements
    Provision,
    /// COPY and INSERT statements
    Load,
}

/// Plan output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutput {
    /// SQL text
    Text,
    /// JSON array of statements
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
