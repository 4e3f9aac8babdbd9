//! Load driver: bulk-load staging tables, then populate the star schema

use crate::error::EtlResult;
use crate::runner::{RunSummary, StatementResult, StatementRunner};
use dwh_core::{CommitMode, Pipeline, StatementKind};
use dwh_db::Warehouse;

/// COPY every source file into its staging table, then run the dimension
/// inserts and finally the fact insert.
///
/// COPY appends to staging. The inserts skip keys already present in
/// their targets, so running this twice without reprovisioning is safe.
pub async fn run_etl<F>(
    db: &dyn Warehouse,
    pipeline: &Pipeline,
    mode: CommitMode,
    on_result: F,
) -> EtlResult<RunSummary>
where
    F: FnMut(&StatementResult),
{
    let statements = pipeline.load_statements(db.dialect())?;
    log::info!(
        "Loading on {} ({} statements, {})",
        db.db_type(),
        statements.len(),
        mode
    );

    let summary = StatementRunner::new(db, mode)
        .run(&statements, on_result)
        .await?;
    log::info!(
        "Loaded {} staging rows and inserted {} rows in {}ms",
        summary.rows(StatementKind::Copy),
        summary.rows(StatementKind::Insert),
        summary.duration.as_millis()
    );
    Ok(summary)
}
