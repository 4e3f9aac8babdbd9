//! Warehouse trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use dwh_core::Dialect;

/// Warehouse abstraction for the ETL drivers
///
/// One connection, one statement in flight. Implementations must be
/// Send + Sync for async operation.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Execute one SQL statement, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Open a transaction
    async fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> DbResult<()>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Execute query returning row count
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// First column of the first row, as text
    async fn query_one(&self, sql: &str) -> DbResult<Option<String>>;

    /// Column names of a table in declaration order
    async fn column_names(&self, table: &str) -> DbResult<Vec<String>>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;

    /// SQL dialect statements must be rendered in
    fn dialect(&self) -> Dialect;
}
