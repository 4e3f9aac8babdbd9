//! dwh-core - Core library for the warehouse ETL
//!
//! This crate provides the star-schema catalog, SQL dialect rendering,
//! bulk-load and transform statement generation, the table dependency DAG,
//! and configuration parsing shared by the drivers.

pub mod catalog;
pub mod config;
pub mod copy;
pub mod dag;
pub mod dialect;
pub mod error;
pub mod pipeline;
pub mod sql_utils;
pub mod statement;
pub mod table_name;
pub mod transform;

pub use catalog::{Catalog, Column, ColumnType, DistStyle, ForeignKey, LayoutHint, TableDef, TableKind};
pub use config::{
    Backend, ClusterConfig, CommitMode, PipelineConfig, SourceLocations, SslMode, WarehouseConfig,
};
pub use copy::{CopySpec, ObjectLocation};
pub use dag::TableDag;
pub use dialect::Dialect;
pub use error::{CoreError, CoreResult};
pub use pipeline::Pipeline;
pub use statement::{SqlPart, Statement, StatementKind};
pub use table_name::TableName;
pub use transform::Transform;
