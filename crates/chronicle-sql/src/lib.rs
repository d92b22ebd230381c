//! Chronicle SQL: a small, dialect-aware builder for parameterized queries.
//!
//! Builders produce a [`Statement`] (text plus ordered parameters). Query
//! shape is the same for every dialect; a [`Dialect`] only decides identifier
//! quoting, the default schema and placeholder syntax.

pub mod condition;
pub mod dialect;
pub mod statement;
pub mod value;

pub use condition::{Comparison, Condition};
pub use dialect::{Dialect, PostgresDialect, SqlServerDialect, SqliteDialect};
pub use statement::{BuildError, Insert, Order, Select, Statement, Table};
pub use value::SqlValue;
