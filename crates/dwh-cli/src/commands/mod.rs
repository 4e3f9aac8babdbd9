//! CLI command implementations

pub(crate) mod common;
pub(crate) mod create_tables;
pub(crate) mod etl;
pub(crate) mod plan;
