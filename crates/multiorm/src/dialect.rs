//! Per-backend SQL dialect strategies.
//!
//! A [`Dialect`] encapsulates everything that differs between backends when
//! rendering a query: identifier quoting, literal quoting, parameter
//! placeholder syntax, and the LIMIT/OFFSET clause grammar. Dialects are
//! stateless and safe to share across any number of concurrent builds.

use crate::value::Value;

/// Backend rendering strategy.
///
/// Implementations must be stateless; all per-query state (parameter
/// numbering in particular) lives in the translator, never here.
pub trait Dialect: Send + Sync {
    /// Dialect identifier, e.g. `"mysql"`.
    fn name(&self) -> &'static str;

    /// Quote a single raw identifier part, doubling embedded quote
    /// characters.
    fn quote_identifier(&self, name: &str) -> String;

    /// Render the parameter placeholder for a 1-based index.
    ///
    /// Positional dialects (`?`) ignore the index; numbered dialects (`$N`)
    /// must render it exactly.
    fn placeholder(&self, index: usize) -> String;

    /// Render the LIMIT/OFFSET clause, or an empty string when both are
    /// absent. Each dialect documents its offset-without-limit policy.
    fn limit_offset(&self, limit: Option<i64>, offset: Option<i64>) -> String;

    /// Render a boolean literal.
    fn bool_literal(&self, value: bool) -> String {
        if value { "TRUE" } else { "FALSE" }.to_string()
    }

    /// Render a bytes literal.
    fn bytes_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex_encode(bytes))
    }

    /// Render a value as an inline SQL literal.
    ///
    /// This is the rare path; queries normally bind values through
    /// placeholders. Text is escaped by doubling single quotes.
    fn quote_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => self.bool_literal(*b),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => quote_text(s),
            Value::Bytes(b) => self.bytes_literal(b),
            Value::Timestamp(t) => quote_text(&t.to_rfc3339()),
            Value::Uuid(u) => quote_text(&u.to_string()),
            Value::Json(j) => quote_text(&j.to_string()),
            #[cfg(feature = "decimal")]
            Value::Decimal(d) => d.to_string(),
        }
    }
}

fn quote_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn quote_with(name: &str, quote: char) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push(quote);
    for ch in name.chars() {
        if ch == quote {
            out.push(quote);
        }
        out.push(ch);
    }
    out.push(quote);
    out
}

/// MySQL dialect: backtick identifiers, positional `?` placeholders.
///
/// OFFSET without LIMIT uses the documented `LIMIT 18446744073709551615`
/// idiom, since MySQL has no native offset-only form.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '`')
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn limit_offset(&self, limit: Option<i64>, offset: Option<i64>) -> String {
        match (limit, offset) {
            (Some(l), Some(o)) => format!("LIMIT {l} OFFSET {o}"),
            (Some(l), None) => format!("LIMIT {l}"),
            (None, Some(o)) => format!("LIMIT 18446744073709551615 OFFSET {o}"),
            (None, None) => String::new(),
        }
    }
}

/// PostgreSQL dialect: double-quoted identifiers, numbered `$N`
/// placeholders, native offset-only support.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '"')
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn limit_offset(&self, limit: Option<i64>, offset: Option<i64>) -> String {
        match (limit, offset) {
            (Some(l), Some(o)) => format!("LIMIT {l} OFFSET {o}"),
            (Some(l), None) => format!("LIMIT {l}"),
            (None, Some(o)) => format!("OFFSET {o}"),
            (None, None) => String::new(),
        }
    }

    fn bytes_literal(&self, bytes: &[u8]) -> String {
        format!("'\\x{}'", hex_encode(bytes))
    }
}

/// SQLite dialect: backtick identifiers (SQLite accepts both backticks and
/// double quotes), positional `?` placeholders.
///
/// OFFSET without LIMIT uses the `LIMIT -1` sentinel required by SQLite's
/// grammar. Booleans render as `1`/`0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_with(name, '`')
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn limit_offset(&self, limit: Option<i64>, offset: Option<i64>) -> String {
        match (limit, offset) {
            (Some(l), Some(o)) => format!("LIMIT {l} OFFSET {o}"),
            (Some(l), None) => format!("LIMIT {l}"),
            (None, Some(o)) => format!("LIMIT -1 OFFSET {o}"),
            (None, None) => String::new(),
        }
    }

    fn bool_literal(&self, value: bool) -> String {
        if value { "1" } else { "0" }.to_string()
    }
}
