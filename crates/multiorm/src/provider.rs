//! Query constructor providers and backend capability declarations.
//!
//! A provider binds a dialect and hands out fresh [`SelectQb`] instances,
//! alongside a static [`Capabilities`] record callers can consult before
//! attempting an operator the backend may not support.

use crate::condition::CmpOp;
use crate::dialect::{Dialect, MySqlDialect, PostgresDialect, SqliteDialect};
use crate::qb::SelectQb;
use crate::schema::Schema;
use std::sync::Arc;

/// Declarative capability set for one backend.
///
/// Pure data, never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    // Condition operators
    pub supports_eq: bool,
    pub supports_ne: bool,
    pub supports_gt: bool,
    pub supports_lt: bool,
    pub supports_gte: bool,
    pub supports_lte: bool,
    pub supports_in: bool,
    pub supports_between: bool,
    pub supports_like: bool,
    pub supports_and: bool,
    pub supports_or: bool,
    pub supports_not: bool,

    // Query features
    pub supports_select: bool,
    pub supports_order_by: bool,
    pub supports_limit: bool,
    pub supports_offset: bool,
    pub supports_join: bool,
    pub supports_subquery: bool,

    // Optimization features
    pub supports_query_plan: bool,
    pub supports_index_hint: bool,

    // Native (non-relational) query support
    pub supports_native_query: bool,
    pub native_query_lang: Option<&'static str>,

    /// Short human-readable description of the backend.
    pub description: String,
}

impl Capabilities {
    /// Default SQL-compatible capability set.
    pub fn default_sql(description: impl Into<String>) -> Self {
        Self {
            supports_eq: true,
            supports_ne: true,
            supports_gt: true,
            supports_lt: true,
            supports_gte: true,
            supports_lte: true,
            supports_in: true,
            supports_between: true,
            supports_like: true,
            supports_and: true,
            supports_or: true,
            supports_not: true,
            supports_select: true,
            supports_order_by: true,
            supports_limit: true,
            supports_offset: true,
            supports_join: true,
            supports_subquery: true,
            supports_query_plan: true,
            supports_index_hint: true,
            supports_native_query: false,
            native_query_lang: None,
            description: description.into(),
        }
    }

    /// Check support for a comparison operator.
    pub fn supports_op(&self, op: CmpOp) -> bool {
        match op {
            CmpOp::Eq => self.supports_eq,
            CmpOp::Ne => self.supports_ne,
            CmpOp::Gt => self.supports_gt,
            CmpOp::Lt => self.supports_lt,
            CmpOp::Gte => self.supports_gte,
            CmpOp::Lte => self.supports_lte,
            CmpOp::In => self.supports_in,
            CmpOp::Between => self.supports_between,
            CmpOp::Like => self.supports_like,
        }
    }
}

/// Factory for dialect-bound query constructors.
pub trait QueryProvider: Send + Sync {
    /// Create a fresh query constructor for a schema.
    fn query(&self, schema: &Schema) -> SelectQb;

    /// Capability declaration for this backend.
    fn capabilities(&self) -> &Capabilities;
}

/// SQL provider: binds one [`Dialect`] plus its capability set.
#[derive(Clone)]
pub struct SqlQueryProvider {
    dialect: Arc<dyn Dialect>,
    capabilities: Capabilities,
}

impl SqlQueryProvider {
    /// Create a provider with the default SQL capability set.
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        let capabilities =
            Capabilities::default_sql(format!("SQL query builder ({})", dialect.name()));
        Self {
            dialect,
            capabilities,
        }
    }

    /// Provider for MySQL.
    pub fn mysql() -> Self {
        Self::new(Arc::new(MySqlDialect))
    }

    /// Provider for PostgreSQL.
    pub fn postgres() -> Self {
        Self::new(Arc::new(PostgresDialect))
    }

    /// Provider for SQLite.
    pub fn sqlite() -> Self {
        Self::new(Arc::new(SqliteDialect))
    }

    /// Override the capability declaration.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// The bound dialect.
    pub fn dialect(&self) -> Arc<dyn Dialect> {
        Arc::clone(&self.dialect)
    }
}

impl QueryProvider for SqlQueryProvider {
    fn query(&self, schema: &Schema) -> SelectQb {
        SelectQb::new(schema.clone(), Arc::clone(&self.dialect))
            .with_capabilities(self.capabilities.clone())
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}

impl std::fmt::Debug for SqlQueryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlQueryProvider")
            .field("dialect", &self.dialect.name())
            .field("capabilities", &self.capabilities.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::eq;

    #[test]
    fn providers_hand_out_dialect_bound_builders() {
        let schema = Schema::new("users");

        let (mysql_sql, _) = SqlQueryProvider::mysql()
            .query(&schema)
            .where_(eq("id", 1))
            .build()
            .unwrap();
        assert!(mysql_sql.contains("`users`"));

        let (pg_sql, _) = SqlQueryProvider::postgres()
            .query(&schema)
            .where_(eq("id", 1))
            .build()
            .unwrap();
        assert!(pg_sql.contains("\"users\""));
        assert!(pg_sql.contains("$1"));
    }

    #[test]
    fn default_sql_capabilities() {
        let caps = SqlQueryProvider::sqlite().capabilities().clone();
        assert!(caps.supports_eq);
        assert!(caps.supports_select);
        assert!(caps.supports_order_by);
        assert!(!caps.supports_native_query);
        assert!(caps.native_query_lang.is_none());
        assert!(caps.supports_op(CmpOp::Between));
    }

    #[test]
    fn narrowed_capabilities_reject_operator_at_build() {
        use crate::condition::like;
        use crate::error::OrmError;

        let mut caps = Capabilities::default_sql("no LIKE backend");
        caps.supports_like = false;
        let provider = SqlQueryProvider::sqlite().with_capabilities(caps);

        let err = provider
            .query(&Schema::new("users"))
            .where_(like("name", "%x%"))
            .build()
            .expect_err("must fail");
        assert!(matches!(err, OrmError::Unsupported { .. }));
        assert!(err.to_string().contains("LIKE"));
    }

    #[test]
    fn capabilities_can_be_narrowed() {
        let mut caps = Capabilities::default_sql("no LIKE backend");
        caps.supports_like = false;
        let provider = SqlQueryProvider::sqlite().with_capabilities(caps);
        assert!(!provider.capabilities().supports_op(CmpOp::Like));
        assert!(provider.capabilities().supports_op(CmpOp::Eq));
    }
}
