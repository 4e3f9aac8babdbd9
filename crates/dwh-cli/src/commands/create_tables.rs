//! Create-tables command implementation

use anyhow::{Context, Result};

use super::common::{connect, load_pipeline, print_failure, print_result, print_summary};
use crate::cli::GlobalArgs;

/// Execute the create-tables command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let (config, pipeline) = load_pipeline(global)?;
    let db = connect(&config).await?;

    println!(
        "Provisioning {} tables on {}...\n",
        pipeline.catalog().tables().len(),
        db.db_type()
    );

    let summary = dwh_etl::create_tables(
        db.as_ref(),
        &pipeline,
        config.pipeline.commit_mode,
        print_result,
    )
    .await
    .inspect_err(print_failure)
    .context("Provisioning failed")?;

    print_summary(&summary);
    Ok(())
}
