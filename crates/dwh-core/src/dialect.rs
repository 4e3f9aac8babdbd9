//! SQL dialects the catalog renders for

use serde::Serialize;
use std::fmt;

/// Target SQL dialect
///
/// Redshift is the production warehouse. DuckDB runs the same pipeline
/// locally and in tests; it accepts the same DML but has no physical
/// layout clauses and no `IAM_ROLE` bulk-load authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Amazon Redshift
    Redshift,
    /// DuckDB
    DuckDb,
}

impl Dialect {
    /// Whether SORTKEY / DISTKEY / DISTSTYLE hints are rendered
    pub fn supports_layout_hints(self) -> bool {
        matches!(self, Dialect::Redshift)
    }

    /// Whether `DROP TABLE` accepts `CASCADE` for referenced tables
    pub fn supports_drop_cascade(self) -> bool {
        matches!(self, Dialect::Redshift)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Redshift => write!(f, "redshift"),
            Dialect::DuckDb => write!(f, "duckdb"),
        }
    }
}
