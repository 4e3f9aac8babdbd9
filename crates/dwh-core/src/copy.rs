//! Bulk-load (COPY) statement generation

use crate::catalog::{ACCIDENT_STAGING, CITY_STAGING, COVID_STAGING};
use crate::config::WarehouseConfig;
use crate::dialect::Dialect;
use crate::error::{CoreError, CoreResult};
use crate::sql_utils::{quote_ident, quote_literal};
use crate::statement::{Statement, StatementKind};
use crate::table_name::TableName;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Location of a source file: an `s3://` URI for Redshift, a local path or
/// glob for DuckDB
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation(String);

impl ObjectLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One bulk load: a CSV file with a header row into a staging table
#[derive(Debug)]
pub struct CopySpec {
    pub table: TableName,
    pub location: ObjectLocation,
    pub credential: Option<SecretString>,
    pub region: String,
}

impl CopySpec {
    /// The three staging loads: collisions, city demographics, pandemic metrics
    pub fn from_config(config: &WarehouseConfig) -> Vec<Self> {
        let spec = |table: &str, location: &ObjectLocation| Self {
            table: TableName::new(table),
            location: location.clone(),
            credential: config
                .iam_role_arn
                .as_ref()
                .map(|arn| SecretString::new(arn.expose_secret().clone())),
            region: config.pipeline.region.clone(),
        };
        vec![
            spec(ACCIDENT_STAGING, &config.sources.accident),
            spec(CITY_STAGING, &config.sources.city),
            spec(COVID_STAGING, &config.sources.covid),
        ]
    }

    /// Render the COPY statement. Appends to the table; never truncates.
    pub fn statement(&self, dialect: Dialect) -> CoreResult<Statement> {
        let mut stmt = Statement::empty(StatementKind::Copy, self.table.clone());
        stmt.push_text(format!(
            "COPY {} FROM {}",
            quote_ident(&self.table),
            quote_literal(self.location.as_str())
        ));

        match dialect {
            Dialect::Redshift => {
                let credential =
                    self.credential
                        .as_ref()
                        .ok_or_else(|| CoreError::ConfigMissingKey {
                            section: "IAM_ROLE".into(),
                            key: "ARN".into(),
                        })?;
                stmt.push_text(" IAM_ROLE ")
                    .push_secret(SecretString::new(credential.expose_secret().clone()))
                    .push_text(format!(
                        " CSV IGNOREHEADER 1 REGION {}",
                        quote_literal(&self.region)
                    ));
            }
            Dialect::DuckDb => {
                stmt.push_text(" (FORMAT CSV, HEADER TRUE)");
            }
        }
        Ok(stmt)
    }
}
