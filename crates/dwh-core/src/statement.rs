//! Executable warehouse statements
//!
//! A [`Statement`] is a sequence of SQL text fragments and secret fragments.
//! Secrets (the bulk-load IAM role) are only spliced into the SQL when the
//! statement is handed to the warehouse via [`Statement::expose`]; every
//! other rendering ([`Display`](std::fmt::Display), [`Statement::redacted`],
//! the JSON plan) shows a placeholder instead.

use crate::sql_utils::quote_literal;
use crate::table_name::TableName;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::fmt;

/// Placeholder rendered in place of secret values
pub const REDACTED: &str = "'****'";

/// What a statement does to its target table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    /// `DROP TABLE IF EXISTS`
    Drop,
    /// `CREATE TABLE IF NOT EXISTS`
    Create,
    /// Bulk `COPY` from object storage
    Copy,
    /// `INSERT INTO … SELECT`
    Insert,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::Drop => write!(f, "DROP"),
            StatementKind::Create => write!(f, "CREATE"),
            StatementKind::Copy => write!(f, "COPY"),
            StatementKind::Insert => write!(f, "INSERT"),
        }
    }
}

/// One fragment of a statement's SQL
#[derive(Debug)]
pub enum SqlPart {
    /// Plain SQL text, emitted verbatim
    Text(String),
    /// A secret value, emitted as an escaped string literal
    Secret(SecretString),
}

/// A single statement targeting one table
#[derive(Debug)]
pub struct Statement {
    kind: StatementKind,
    table: TableName,
    parts: Vec<SqlPart>,
}

impl Statement {
    /// Create a statement from plain SQL text
    pub fn new(kind: StatementKind, table: TableName, sql: impl Into<String>) -> Self {
        Self {
            kind,
            table,
            parts: vec![SqlPart::Text(sql.into())],
        }
    }

    /// Create a statement with no SQL yet; fill it with [`push_text`](Self::push_text)
    /// and [`push_secret`](Self::push_secret)
    pub fn empty(kind: StatementKind, table: TableName) -> Self {
        Self {
            kind,
            table,
            parts: Vec::new(),
        }
    }

    /// Append SQL text
    pub fn push_text(&mut self, sql: impl Into<String>) -> &mut Self {
        self.parts.push(SqlPart::Text(sql.into()));
        self
    }

    /// Append a secret, rendered as a string literal on execution
    pub fn push_secret(&mut self, secret: SecretString) -> &mut Self {
        self.parts.push(SqlPart::Secret(secret));
        self
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Whether any fragment is a secret
    pub fn contains_secret(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, SqlPart::Secret(_)))
    }

    /// SQL with secrets replaced by [`REDACTED`], safe to log
    pub fn redacted(&self) -> String {
        self.render(|_| REDACTED.to_string())
    }

    /// SQL with secrets spliced in as escaped literals.
    ///
    /// Only the warehouse backend should call this.
    pub fn expose(&self) -> String {
        self.render(|secret| quote_literal(secret.expose_secret()))
    }

    /// Serializable view with secrets redacted
    pub fn planned(&self) -> PlannedStatement<'_> {
        PlannedStatement {
            kind: self.kind,
            table: self.table.as_str(),
            sql: self.redacted(),
        }
    }

    fn render(&self, secret: impl Fn(&SecretString) -> String) -> String {
        let mut sql = String::new();
        for part in &self.parts {
            match part {
                SqlPart::Text(text) => sql.push_str(text),
                SqlPart::Secret(value) => sql.push_str(&secret(value)),
            }
        }
        sql
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

/// JSON-friendly statement description used by `dwh plan`
#[derive(Debug, Serialize)]
pub struct PlannedStatement<'a> {
    pub kind: StatementKind,
    pub table: &'a str,
    pub sql: String,
}
