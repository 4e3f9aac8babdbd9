//! SQL quoting utilities
//!
//! Every identifier and literal the catalog renders goes through these helpers,
//! so values read from configuration never reach the warehouse unescaped.

/// Quote a SQL identifier.
///
/// Wraps the identifier in double quotes and escapes any embedded double quotes
/// by doubling them, following the SQL standard.
///
/// # Examples
/// ```
/// use dwh_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("time_table"), r#""time_table""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Escape a SQL string literal value by doubling single quotes.
///
/// This is for use inside single-quoted SQL string literals, not identifiers.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render a complete single-quoted SQL string literal.
///
/// # Examples
/// ```
/// use dwh_core::sql_utils::quote_literal;
/// assert_eq!(quote_literal("s3://bucket/key.csv"), "'s3://bucket/key.csv'");
/// assert_eq!(quote_literal("O'Hare"), "'O''Hare'");
/// ```
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

/// Strip one pair of matching surrounding quotes from a configuration value.
///
/// Config files written for shell-style interpolation often store values as
/// `'s3://bucket/key'`; the quotes are not part of the value.
pub fn strip_wrapping_quotes(value: &str) -> &str {
    let trimmed = value.trim();
    for quote in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

#[cfg(test)]
#[path = "sql_utils_test.rs"]
mod tests;
