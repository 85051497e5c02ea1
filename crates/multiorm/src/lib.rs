//! # multiorm
//!
//! A lightweight, dialect-generic database abstraction layer for Rust.
//!
//! ## Features
//!
//! - **Schema definition**: table + field metadata via fluent builders
//! - **Changesets**: cast external data against a schema, track changes,
//!   validate (required/length/format/inclusion/number)
//! - **Three-layer query construction**: condition tree → dialect-aware
//!   translation → fluent SELECT builder, producing `(sql, params)` pairs
//! - **Multiple dialects**: MySQL, PostgreSQL and SQLite quoting/placeholder
//!   strategies out of the box
//! - **Providers & capabilities**: pick a backend at runtime and query its
//!   declared operator support before building
//! - **Migrations**: plain-SQL disk migrations with up/down/status/diff
//!   workflows over any executor
//!
//! Execution is delegated: the engine never opens connections. Anything that
//! implements [`Executor`](client::Executor) (a driver adapter, a pool
//! handle, a test double) can run the generated statements.
//!
//! ## Query building
//!
//! ```
//! use multiorm::condition::{eq, gt};
//! use multiorm::provider::{QueryProvider, SqlQueryProvider};
//! use multiorm::qb::Direction;
//! use multiorm::schema::Schema;
//!
//! let provider = SqlQueryProvider::postgres();
//! let schema = Schema::new("users");
//!
//! let (sql, args) = provider
//!     .query(&schema)
//!     .select(&["id", "name"])
//!     .where_(eq("status", "active"))
//!     .where_any(vec![gt("age", 18), eq("vip", true)])
//!     .order_by("id", Direction::Asc)
//!     .limit(20)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT \"id\", \"name\" FROM \"users\" WHERE \"status\" = $1 AND \
//!      (\"age\" > $2 OR \"vip\" = $3) ORDER BY \"id\" ASC LIMIT 20"
//! );
//! assert_eq!(args.len(), 3);
//! ```

pub mod changeset;
pub mod client;
pub mod condition;
pub mod dialect;
pub mod error;
pub mod ident;
pub mod migrate;
pub mod provider;
pub mod qb;
pub mod schema;
pub mod validate;
pub mod value;

#[cfg(feature = "config")]
pub mod config;

pub use changeset::{Changeset, NumberBounds};
pub use client::{Executor, Repository, Row};
pub use condition::{BoolOp, CmpOp, CondValue, Condition};
pub use dialect::{Dialect, MySqlDialect, PostgresDialect, SqliteDialect};
pub use error::{OrmError, OrmResult};
pub use ident::Ident;
pub use migrate::{AppliedMigration, DiskMigration, MigrationRunner, MigrationStatus};
pub use provider::{Capabilities, QueryProvider, SqlQueryProvider};
pub use qb::{Direction, SelectQb, Translator};
pub use schema::{Field, FieldBuilder, FieldType, Schema, SchemaRegistry};
pub use validate::{ValidationCode, ValidationError, ValidationErrors};
pub use value::Value;

#[cfg(feature = "config")]
pub use config::{AdapterKind, Config, PoolConfig};
