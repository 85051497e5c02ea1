//! Query builder (QB) system.
//!
//! Three layers, leaf to root:
//!
//! - [`Condition`](crate::condition::Condition): the backend-agnostic
//!   predicate tree, built with the factory functions in
//!   [`crate::condition`].
//! - [`Translator`]: renders a condition tree into a SQL fragment plus an
//!   ordered argument list against one dialect, with global placeholder
//!   numbering.
//! - [`SelectQb`]: the fluent constructor accumulating select columns,
//!   conditions, ordering and pagination, and assembling the final
//!   statement.
//!
//! # Usage
//!
//! ```
//! use multiorm::condition::{eq, gt};
//! use multiorm::qb::{select, Direction};
//! use multiorm::dialect::MySqlDialect;
//! use multiorm::schema::Schema;
//! use std::sync::Arc;
//!
//! let schema = Schema::new("users");
//! let (sql, args) = select(&schema, Arc::new(MySqlDialect))
//!     .where_(eq("status", "active"))
//!     .where_(gt("age", 18))
//!     .order_by("created_at", Direction::Desc)
//!     .limit(20)
//!     .build()
//!     .unwrap();
//! assert!(sql.starts_with("SELECT * FROM `users` WHERE"));
//! assert_eq!(args.len(), 2);
//! ```

mod select;
mod translate;

pub use select::{Direction, SelectQb};
pub use translate::{ParamList, Translator};

use crate::dialect::Dialect;
use crate::schema::Schema;
use std::sync::Arc;

/// Create a SELECT query builder for a schema with the given dialect.
pub fn select(schema: &Schema, dialect: Arc<dyn Dialect>) -> SelectQb {
    SelectQb::new(schema.clone(), dialect)
}

#[cfg(test)]
mod tests;
