//! SELECT query builder bound to a schema and a dialect.

use crate::client::{Executor, Row};
use crate::condition::{and, or, Condition};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::provider::Capabilities;
use crate::qb::translate::Translator;
use crate::schema::Schema;
use crate::value::Value;
use std::any::Any;
use std::sync::Arc;

/// ORDER BY direction, validated at the builder boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// SQL keyword, exactly `ASC` or `DESC`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }

    /// Parse a direction string, case-insensitively.
    pub fn parse(s: &str) -> OrmResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            other => Err(OrmError::validation(format!(
                "invalid order direction '{other}', expected ASC or DESC"
            ))),
        }
    }
}

/// Fluent SELECT builder.
///
/// Single-owner, single-query state: accumulate clauses in any order, then
/// `build()`. Building takes `&self` and allocates a fresh translator, so
/// repeated builds of an unmutated builder are byte-identical.
///
/// Not thread-safe: build one query per owner and discard.
#[derive(Clone)]
pub struct SelectQb {
    schema: Schema,
    dialect: Arc<dyn Dialect>,
    /// SELECT columns; empty means `*`
    select_cols: Vec<String>,
    /// Top-level conditions, AND-joined
    conditions: Vec<Condition>,
    /// ORDER BY terms
    order_clauses: Vec<(String, Direction)>,
    limit: Option<i64>,
    offset: Option<i64>,
    /// Backend capability set, when provider-bound
    capabilities: Option<Capabilities>,
}

impl SelectQb {
    /// Create a builder for a schema with the given dialect.
    pub fn new(schema: Schema, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            schema,
            dialect,
            select_cols: Vec::new(),
            conditions: Vec::new(),
            order_clauses: Vec::new(),
            limit: None,
            offset: None,
            capabilities: None,
        }
    }

    /// Attach the backend's capability set; `build()` then rejects
    /// operators the backend does not declare.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// Append one condition to the top-level AND list.
    pub fn where_(mut self, cond: Condition) -> Self {
        self.conditions.push(cond);
        self
    }

    /// Append a single AND group over the given conditions.
    pub fn where_all(mut self, conds: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.push(and(conds.into_iter().collect()));
        self
    }

    /// Append a single OR group over the given conditions.
    pub fn where_any(mut self, conds: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.push(or(conds.into_iter().collect()));
        self
    }

    /// Replace the column selection; an empty selection means `SELECT *`.
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select_cols = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Append one ORDER BY term.
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_clauses.push((field.to_string(), direction));
        self
    }

    /// Set LIMIT. Negative values are rejected at build time.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Set OFFSET. Negative values are rejected at build time.
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    /// The bound schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The bound dialect.
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Escape hatch to the backend-specific builder representation.
    ///
    /// For SQL backends this is the builder itself; non-relational providers
    /// may hand out their native pipeline/graph builder here.
    pub fn native_builder(&self) -> &dyn Any {
        self
    }

    fn build_sql(&self, count: bool) -> OrmResult<(String, Vec<Value>)> {
        if let Some(l) = self.limit {
            if l < 0 {
                return Err(OrmError::build(format!("negative LIMIT: {l}")));
            }
        }
        if let Some(o) = self.offset {
            if o < 0 {
                return Err(OrmError::build(format!("negative OFFSET: {o}")));
            }
        }

        let dialect = self.dialect.as_ref();
        let table = Ident::parse(self.schema.table_name())
            .map_err(|e| OrmError::build(format!("invalid table name: {e}")))?
            .to_sql(dialect);

        let select_part = if count {
            "COUNT(*)".to_string()
        } else if self.select_cols.is_empty() {
            "*".to_string()
        } else {
            let mut cols = Vec::with_capacity(self.select_cols.len());
            for col in &self.select_cols {
                let quoted = Ident::parse(col)
                    .map_err(|e| OrmError::build(format!("invalid select column '{col}': {e}")))?
                    .to_sql(dialect);
                cols.push(quoted);
            }
            cols.join(", ")
        };

        let mut sql = format!("SELECT {select_part} FROM {table}");

        if let Some(caps) = &self.capabilities {
            for cond in &self.conditions {
                for op in cond.operators() {
                    if !caps.supports_op(op) {
                        return Err(OrmError::unsupported(
                            dialect.name(),
                            format!("operator {}", op.symbol()),
                        ));
                    }
                }
            }
        }

        let mut translator = Translator::new(dialect);
        if !self.conditions.is_empty() {
            let mut parts = Vec::with_capacity(self.conditions.len());
            for cond in &self.conditions {
                parts.push(translator.translate_condition(cond)?);
            }
            sql.push_str(" WHERE ");
            sql.push_str(&parts.join(" AND "));
        }

        if !count {
            if !self.order_clauses.is_empty() {
                let mut terms = Vec::with_capacity(self.order_clauses.len());
                for (field, dir) in &self.order_clauses {
                    let quoted = Ident::parse(field)
                        .map_err(|e| {
                            OrmError::build(format!("invalid order column '{field}': {e}"))
                        })?
                        .to_sql(dialect);
                    terms.push(format!("{quoted} {}", dir.as_str()));
                }
                sql.push_str(" ORDER BY ");
                sql.push_str(&terms.join(", "));
            }

            let limit_offset = dialect.limit_offset(self.limit, self.offset);
            if !limit_offset.is_empty() {
                sql.push(' ');
                sql.push_str(&limit_offset);
            }
        }

        let params = translator.into_params();
        tracing::debug!(
            dialect = dialect.name(),
            params = params.len(),
            sql = %sql,
            "built query"
        );
        Ok((sql, params))
    }

    /// Assemble the final SQL and ordered argument list.
    pub fn build(&self) -> OrmResult<(String, Vec<Value>)> {
        self.build_sql(false)
    }

    /// Assemble the COUNT(*) variant (same WHERE, no ordering/pagination).
    pub fn build_count(&self) -> OrmResult<(String, Vec<Value>)> {
        self.build_sql(true)
    }

    // ==================== Execution ====================

    /// Execute and return all rows.
    pub async fn fetch_all(&self, conn: &impl Executor) -> OrmResult<Vec<Row>> {
        let (sql, params) = self.build()?;
        conn.query(&sql, &params).await
    }

    /// Execute and return at most one row.
    pub async fn fetch_opt(&self, conn: &impl Executor) -> OrmResult<Option<Row>> {
        let (sql, params) = self.build()?;
        conn.query_opt(&sql, &params).await
    }

    /// Execute and return exactly one row.
    pub async fn fetch_one(&self, conn: &impl Executor) -> OrmResult<Row> {
        let (sql, params) = self.build()?;
        conn.query_one(&sql, &params).await
    }

    /// Execute the COUNT(*) variant.
    pub async fn count(&self, conn: &impl Executor) -> OrmResult<i64> {
        let (sql, params) = self.build_count()?;
        let row = conn.query_one(&sql, &params).await?;
        row.first()
            .and_then(Value::as_i64)
            .ok_or_else(|| OrmError::decode("count", "expected integer count column"))
    }
}

impl std::fmt::Debug for SelectQb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectQb")
            .field("table", &self.schema.table_name())
            .field("dialect", &self.dialect.name())
            .field("select_cols", &self.select_cols)
            .field("conditions", &self.conditions.len())
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish()
    }
}
