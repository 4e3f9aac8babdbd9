//! Error types for dwh-etl

use dwh_core::{CoreError, StatementKind, TableName};
use dwh_db::DbError;
use thiserror::Error;

/// Driver errors
#[derive(Error, Debug)]
pub enum EtlError {
    /// A COPY into a staging table failed (L001)
    #[error("[L001] Bulk load into {table} failed: {source}")]
    BulkLoad { table: TableName, source: DbError },

    /// A DROP, CREATE or INSERT failed (L002)
    #[error("[L002] {kind} {table} failed: {source}")]
    Statement {
        kind: StatementKind,
        table: TableName,
        source: DbError,
    },

    /// Rolling back after a failure also failed (L003)
    #[error("[L003] Rollback failed: {source} (after: {original})")]
    RollbackFailed { original: String, source: DbError },

    /// Transaction control outside of a statement failed
    #[error(transparent)]
    Database(#[from] DbError),

    /// Building the statement plan failed
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl EtlError {
    /// Wrap a failure of `kind` against `table`
    pub(crate) fn failed(kind: StatementKind, table: TableName, source: DbError) -> Self {
        match kind {
            StatementKind::Copy => EtlError::BulkLoad { table, source },
            _ => EtlError::Statement {
                kind,
                table,
                source,
            },
        }
    }

    /// Kind and target of the statement that failed, if one did
    pub fn failed_statement(&self) -> Option<(StatementKind, &TableName)> {
        match self {
            EtlError::BulkLoad { table, .. } => Some((StatementKind::Copy, table)),
            EtlError::Statement { kind, table, .. } => Some((*kind, table)),
            _ => None,
        }
    }
}

/// Result type alias for EtlError
pub type EtlResult<T> = Result<T, EtlError>;
