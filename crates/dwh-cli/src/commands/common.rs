//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use dwh_core::{Backend, Pipeline, WarehouseConfig};
use dwh_db::{DuckDbBackend, RedshiftBackend, Warehouse};
use dwh_etl::{EtlError, RunSummary, StatementResult};
use std::path::Path;

use crate::cli::GlobalArgs;

/// Load the warehouse config named by `--config`
pub(crate) fn load_config(global: &GlobalArgs) -> Result<WarehouseConfig> {
    let path = Path::new(&global.config);
    let config = WarehouseConfig::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    log::debug!(
        "Backend: {}, commit mode: {}",
        config.pipeline.backend,
        config.pipeline.commit_mode
    );
    Ok(config)
}

/// Load config and build the pipeline it describes
pub(crate) fn load_pipeline(global: &GlobalArgs) -> Result<(WarehouseConfig, Pipeline)> {
    let config = load_config(global)?;
    let pipeline = Pipeline::from_config(&config);
    Ok((config, pipeline))
}

/// Open a connection to the configured warehouse
pub(crate) async fn connect(config: &WarehouseConfig) -> Result<Box<dyn Warehouse>> {
    match config.pipeline.backend {
        Backend::Redshift => {
            let cluster = config
                .cluster
                .as_ref()
                .context("[CLUSTER] is required for the redshift backend")?;
            let db = RedshiftBackend::connect(cluster).await.with_context(|| {
                format!(
                    "Failed to connect to {}:{}/{}",
                    cluster.host, cluster.port, cluster.database
                )
            })?;
            Ok(Box::new(db))
        }
        Backend::DuckDb => {
            let path = &config.pipeline.duckdb_path;
            let db = DuckDbBackend::new(path)
                .with_context(|| format!("Failed to open DuckDB database: {}", path))?;
            Ok(Box::new(db))
        }
    }
}

/// Print one executed statement
pub(crate) fn print_result(result: &StatementResult) {
    println!(
        "  ✓ {} {} ({} rows) [{}ms]",
        result.kind,
        result.table,
        result.rows,
        result.duration.as_millis()
    );
}

/// Print the statement a driver stopped at
pub(crate) fn print_failure(error: &EtlError) {
    if let Some((kind, table)) = error.failed_statement() {
        println!("  ✗ {} {}", kind, table);
    }
}

/// Print the closing line of a driver run
pub(crate) fn print_summary(summary: &RunSummary) {
    println!();
    println!(
        "Completed {} statements ({}) in {}ms",
        summary.total(),
        summary.mode,
        summary.duration.as_millis()
    );
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
