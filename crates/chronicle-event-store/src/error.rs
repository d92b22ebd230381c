//! SQL backend errors.

use chronicle_core::error::DomainError;
use chronicle_sql::BuildError;
use thiserror::Error;

/// Failures raised by a [`crate::executor::SqlExecutor`].
#[derive(Debug, Error)]
pub enum SqlError {
    /// The statement at this index in a transaction hit a unique constraint.
    #[error("statement {statement} violated a unique constraint")]
    UniqueViolation {
        /// Zero-based index into the transaction's statements.
        statement: usize,
    },

    /// Any other driver error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A statement could not be built.
    #[error("invalid statement: {0}")]
    Build(#[from] BuildError),

    /// A row could not be mapped back to a stored event.
    #[error("undecodable row: {0}")]
    Decode(String),
}

impl SqlError {
    /// Classifies a driver error raised by the statement at `statement`.
    #[must_use]
    pub fn at_statement(statement: usize, err: sqlx::Error) -> Self {
        let unique = err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique {
            Self::UniqueViolation { statement }
        } else {
            Self::Database(err)
        }
    }
}

impl From<SqlError> for DomainError {
    fn from(err: SqlError) -> Self {
        Self::Storage(err.to_string())
    }
}
