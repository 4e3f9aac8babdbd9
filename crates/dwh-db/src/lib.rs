//! dwh-db - Warehouse abstraction layer
//!
//! This crate provides the `Warehouse` trait and its backends: Redshift
//! over the PostgreSQL wire protocol, and an embedded DuckDB used for
//! local runs and tests.

pub mod duckdb;
pub mod error;
pub mod redshift;
pub mod traits;

pub use self::duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use redshift::RedshiftBackend;
pub use traits::Warehouse;
