//! Sequential statement execution

use crate::error::{EtlError, EtlResult};
use dwh_core::{CommitMode, Statement, StatementKind, TableName};
use dwh_db::{DbError, Warehouse};
use std::time::{Duration, Instant};

/// Result of a single executed statement
#[derive(Debug, Clone)]
pub struct StatementResult {
    /// What the statement did
    pub kind: StatementKind,

    /// Target table
    pub table: TableName,

    /// Rows affected as reported by the warehouse
    pub rows: usize,

    /// Execution time
    pub duration: Duration,
}

/// Summary of a driver run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Per-statement results, in execution order
    pub results: Vec<StatementResult>,

    /// Commit policy the run used
    pub mode: CommitMode,

    /// Total execution time
    pub duration: Duration,
}

impl RunSummary {
    /// Number of statements executed
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Rows affected by statements of `kind`
    pub fn rows(&self, kind: StatementKind) -> usize {
        self.results
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.rows)
            .sum()
    }
}

/// Runs statements one at a time, stopping at the first failure
pub struct StatementRunner<'a> {
    db: &'a dyn Warehouse,
    mode: CommitMode,
}

impl<'a> StatementRunner<'a> {
    /// Create a new statement runner
    pub fn new(db: &'a dyn Warehouse, mode: CommitMode) -> Self {
        Self { db, mode }
    }

    /// Execute `statements` in order.
    ///
    /// `on_result` is called after each statement succeeds. In
    /// [`CommitMode::PerStatement`] every statement is committed before the
    /// next starts; in [`CommitMode::Atomic`] the whole sequence shares one
    /// transaction. Either way a failure rolls back the open transaction and
    /// the original error is returned.
    pub async fn run<F>(&self, statements: &[Statement], mut on_result: F) -> EtlResult<RunSummary>
    where
        F: FnMut(&StatementResult),
    {
        let start = Instant::now();
        let mut results = Vec::with_capacity(statements.len());

        if self.mode == CommitMode::Atomic {
            self.db.begin().await?;
        }

        for statement in statements {
            let result = self.run_statement(statement).await?;
            on_result(&result);
            results.push(result);
        }

        if self.mode == CommitMode::Atomic {
            self.db.commit().await?;
        }

        Ok(RunSummary {
            results,
            mode: self.mode,
            duration: start.elapsed(),
        })
    }

    async fn run_statement(&self, statement: &Statement) -> EtlResult<StatementResult> {
        log::debug!("{} {}: {}", statement.kind(), statement.table(), statement);

        if self.mode == CommitMode::PerStatement {
            self.db.begin().await?;
        }

        let start = Instant::now();
        let rows = match self.db.execute(&statement.expose()).await {
            Ok(rows) => rows,
            Err(e) => return Err(self.abort(statement, e).await),
        };

        if self.mode == CommitMode::PerStatement {
            self.db.commit().await?;
        }

        Ok(StatementResult {
            kind: statement.kind(),
            table: statement.table().clone(),
            rows,
            duration: start.elapsed(),
        })
    }

    /// Roll back the open transaction after `statement` failed
    async fn abort(&self, statement: &Statement, source: DbError) -> EtlError {
        let error = EtlError::failed(statement.kind(), statement.table().clone(), source);
        log::error!("{}", error);

        match self.db.rollback().await {
            Ok(()) => {
                log::warn!("Rolled back {} transaction", self.mode);
                error
            }
            Err(rollback) => EtlError::RollbackFailed {
                original: error.to_string(),
                source: rollback,
            },
        }
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
