//! Etl command implementation

use anyhow::{Context, Result};
use dwh_core::StatementKind;

use super::common::{connect, load_pipeline, print_failure, print_result, print_summary};
use crate::cli::GlobalArgs;

/// Execute the etl command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let (config, pipeline) = load_pipeline(global)?;
    let db = connect(&config).await?;

    println!(
        "Loading {} sources into {} tables on {}...\n",
        pipeline.copies().len(),
        pipeline.transforms().len(),
        db.db_type()
    );

    let summary = dwh_etl::run_etl(
        db.as_ref(),
        &pipeline,
        config.pipeline.commit_mode,
        print_result,
    )
    .await
    .inspect_err(print_failure)
    .context("Load failed")?;

    print_summary(&summary);
    println!(
        "Staged {} rows, inserted {} rows",
        summary.rows(StatementKind::Copy),
        summary.rows(StatementKind::Insert)
    );
    Ok(())
}
