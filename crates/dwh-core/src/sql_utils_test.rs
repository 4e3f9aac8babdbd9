use super::*;

#[test]
fn test_quote_ident_simple() {
    assert_eq!(quote_ident("accident_table"), r#""accident_table""#);
}

#[test]
fn test_quote_ident_with_embedded_quotes() {
    assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
}

#[test]
fn test_quote_ident_keyword_column() {
    // Columns such as "day" and "stop" collide with SQL keywords
    assert_eq!(quote_ident("day"), r#""day""#);
}

#[test]
fn test_quote_literal_escapes_single_quotes() {
    assert_eq!(quote_literal("it's"), "'it''s'");
}

#[test]
fn test_quote_literal_injection_attempt() {
    let rendered = quote_literal("x'; DROP TABLE city_table; --");
    assert_eq!(rendered, "'x''; DROP TABLE city_table; --'");
}

#[test]
fn test_strip_wrapping_single_quotes() {
    assert_eq!(
        strip_wrapping_quotes("'s3://bucket/accidents.csv'"),
        "s3://bucket/accidents.csv"
    );
}

#[test]
fn test_strip_wrapping_double_quotes() {
    assert_eq!(strip_wrapping_quotes("\"United States\""), "United States");
}

#[test]
fn test_strip_wrapping_quotes_leaves_unbalanced() {
    assert_eq!(strip_wrapping_quotes("'abc"), "'abc");
    assert_eq!(strip_wrapping_quotes("'"), "'");
}

#[test]
fn test_strip_wrapping_quotes_trims_whitespace() {
    assert_eq!(strip_wrapping_quotes("  plain  "), "plain");
}
