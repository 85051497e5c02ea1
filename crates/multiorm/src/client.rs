//! Execution boundary: the [`Executor`] trait, result rows, and the
//! [`Repository`] facade.
//!
//! The query engine itself performs no I/O: it produces `(sql, params)`
//! pairs. An `Executor` is the external collaborator (a concrete driver or a
//! pool handle) that binds those params and talks to the database.

use crate::error::{OrmError, OrmResult};
use crate::provider::{Capabilities, QueryProvider, SqlQueryProvider};
use crate::qb::SelectQb;
use crate::schema::Schema;
use crate::value::Value;
use chrono::{DateTime, Utc};

/// One result row: ordered column name → value pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push((name.into(), value));
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look up a column by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, v)| v)
    }

    /// Look up a column, erroring if absent.
    pub fn try_get(&self, name: &str) -> OrmResult<&Value> {
        self.get(name)
            .ok_or_else(|| OrmError::decode(name, "column not present in row"))
    }

    /// Column value as i64.
    pub fn try_i64(&self, name: &str) -> OrmResult<i64> {
        let value = self.try_get(name)?;
        value
            .as_i64()
            .ok_or_else(|| OrmError::decode(name, format!("expected int, got {}", value.type_name())))
    }

    /// Column value as text.
    pub fn try_str(&self, name: &str) -> OrmResult<&str> {
        let value = self.try_get(name)?;
        value
            .as_str()
            .ok_or_else(|| OrmError::decode(name, format!("expected text, got {}", value.type_name())))
    }

    /// Column value as a UTC timestamp; RFC 3339 text is accepted.
    pub fn try_timestamp(&self, name: &str) -> OrmResult<DateTime<Utc>> {
        match self.try_get(name)? {
            Value::Timestamp(t) => Ok(*t),
            Value::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| OrmError::decode(name, format!("bad timestamp: {e}"))),
            other => Err(OrmError::decode(
                name,
                format!("expected timestamp, got {}", other.type_name()),
            )),
        }
    }

    /// Iterate over (name, value) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// First column value, if any. Convenient for scalar queries.
    pub fn first(&self) -> Option<&Value> {
        self.columns.first().map(|(_, v)| v)
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Database executor boundary.
///
/// Implemented by driver adapters; the library only ever hands over finished
/// SQL text plus the ordered argument list.
pub trait Executor: Send + Sync {
    /// Run a statement, returning the affected row count.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send;

    /// Run a query, returning all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Run a query, returning at most one row.
    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Option<Row>>> + Send {
        async move {
            let mut rows = self.query(sql, params).await?;
            if rows.len() > 1 {
                return Err(OrmError::Query(format!(
                    "expected at most one row, got {}",
                    rows.len()
                )));
            }
            Ok(rows.pop())
        }
    }

    /// Run a query, returning exactly one row.
    fn query_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Row>> + Send {
        async move {
            self.query_opt(sql, params)
                .await?
                .ok_or_else(|| OrmError::not_found("query returned no rows"))
        }
    }
}

/// Repository facade binding an executor to a query provider.
#[derive(Debug)]
pub struct Repository<E: Executor> {
    executor: E,
    provider: SqlQueryProvider,
}

impl<E: Executor> Repository<E> {
    /// Create a repository over an executor and provider.
    pub fn new(executor: E, provider: SqlQueryProvider) -> Self {
        Self { executor, provider }
    }

    /// Fresh query builder bound to this repository's dialect.
    pub fn query_builder(&self, schema: &Schema) -> SelectQb {
        self.provider.query(schema)
    }

    /// Capability set of the bound backend.
    pub fn capabilities(&self) -> &Capabilities {
        self.provider.capabilities()
    }

    /// The bound provider.
    pub fn provider(&self) -> &SqlQueryProvider {
        &self.provider
    }

    /// The underlying executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run a statement through the executor.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.executor.execute(sql, params).await
    }

    /// Run a query through the executor.
    pub async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.executor.query(sql, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_lookup_and_typed_getters() {
        let row: Row = [
            ("id".to_string(), Value::Int(7)),
            ("name".to_string(), Value::Text("alice".into())),
        ]
        .into_iter()
        .collect();

        assert_eq!(row.len(), 2);
        assert_eq!(row.try_i64("id").unwrap(), 7);
        assert_eq!(row.try_str("name").unwrap(), "alice");
        assert!(row.try_get("missing").is_err());
        assert!(row.try_i64("name").is_err());
    }

    #[test]
    fn row_timestamp_accepts_text() {
        let mut row = Row::new();
        row.insert("applied_at", Value::Text("2024-05-01T12:00:00Z".into()));
        assert!(row.try_timestamp("applied_at").is_ok());

        let mut bad = Row::new();
        bad.insert("applied_at", Value::Int(1));
        assert!(bad.try_timestamp("applied_at").is_err());
    }

    #[test]
    fn row_first_for_scalar_queries() {
        let mut row = Row::new();
        row.insert("count", Value::Int(3));
        assert_eq!(row.first(), Some(&Value::Int(3)));
    }
}
