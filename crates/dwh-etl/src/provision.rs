//! Provisioning driver: drop and recreate every table

use crate::error::EtlResult;
use crate::runner::{RunSummary, StatementResult, StatementRunner};
use dwh_core::{CommitMode, Pipeline};
use dwh_db::Warehouse;

/// Drop every table in the catalog, dependents first, then create every
/// table, dependencies first.
///
/// Dropping a table that does not exist is not an error, so this also
/// provisions an empty warehouse.
pub async fn create_tables<F>(
    db: &dyn Warehouse,
    pipeline: &Pipeline,
    mode: CommitMode,
    on_result: F,
) -> EtlResult<RunSummary>
where
    F: FnMut(&StatementResult),
{
    let statements = pipeline.provision_statements(db.dialect())?;
    log::info!(
        "Provisioning {} tables on {} ({} statements, {})",
        pipeline.catalog().tables().len(),
        db.db_type(),
        statements.len(),
        mode
    );

    let summary = StatementRunner::new(db, mode)
        .run(&statements, on_result)
        .await?;
    log::info!("Provisioned in {}ms", summary.duration.as_millis());
    Ok(summary)
}
