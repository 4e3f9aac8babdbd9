//! dwh-etl - Provisioning and load drivers for the warehouse
//!
//! This crate runs the statement plans built by `dwh-core` against a
//! `dwh-db` warehouse: the provisioning driver (drop and recreate every
//! table) and the load driver (bulk-load staging, then transform).

pub mod error;
pub mod load;
pub mod provision;
pub mod runner;

pub use error::{EtlError, EtlResult};
pub use load::run_etl;
pub use provision::create_tables;
pub use runner::{RunSummary, StatementResult, StatementRunner};
