//! Chronicle Event Store: storage backends for the `EventStore` contract.
//!
//! [`InMemoryEventStore`] keeps events in process. [`SqlEventStore`] writes
//! one row per event through a [`SqlExecutor`]; executors are provided for
//! `PostgreSQL` ([`PgExecutor`]) and `SQLite` ([`SqliteExecutor`]).

pub mod error;
pub mod executor;
pub mod memory;
pub mod postgres;
pub mod schema;
pub mod sql_store;
pub mod sqlite;

pub use error::SqlError;
pub use executor::SqlExecutor;
pub use memory::InMemoryEventStore;
pub use postgres::PgExecutor;
pub use sql_store::SqlEventStore;
pub use sqlite::SqliteExecutor;
