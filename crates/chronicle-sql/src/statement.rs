//! SELECT and INSERT builders.

use thiserror::Error;

use crate::condition::{Condition, Renderer};
use crate::dialect::Dialect;
use crate::value::SqlValue;

/// Errors raised while building a statement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// An INSERT names no columns.
    #[error("insert into {table} names no columns")]
    NoColumns {
        /// Target table.
        table: String,
    },
    /// An INSERT has no rows.
    #[error("insert into {table} has no rows")]
    NoRows {
        /// Target table.
        table: String,
    },
    /// A row's width differs from the column list.
    #[error("row {row} has {found} values, expected {expected}")]
    ColumnCountMismatch {
        /// Zero-based row index.
        row: usize,
        /// Number of columns.
        expected: usize,
        /// Number of values supplied.
        found: usize,
    },
}

/// Rendered statement text with its ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// SQL text with dialect placeholders.
    pub text: String,
    /// Parameters, in placeholder order.
    pub params: Vec<SqlValue>,
}

/// A possibly schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    schema: Option<String>,
    name: String,
}

impl Table {
    /// A table in the dialect's default schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    /// Places the table in an explicit schema.
    #[must_use]
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// The unqualified table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders the quoted, schema-qualified name for `dialect`.
    #[must_use]
    pub fn qualified(&self, dialect: &dyn Dialect) -> String {
        let table = dialect.quote_identifier(&self.name);
        match self.schema.as_deref().or(dialect.default_schema()) {
            Some(schema) => format!("{}.{table}", dialect.quote_identifier(schema)),
            None => table,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// `SELECT columns FROM table [WHERE ...] [ORDER BY ...]`
#[derive(Debug, Clone)]
pub struct Select {
    table: Table,
    columns: Vec<String>,
    filter: Option<Condition>,
    order_by: Vec<(String, Order)>,
}

impl Select {
    /// Starts a query over `table`.
    #[must_use]
    pub fn from(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            filter: None,
            order_by: Vec::new(),
        }
    }

    /// Selects these columns; none selects `*`.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| (*c).to_owned()).collect();
        self
    }

    /// Adds a condition, conjoined with any existing one.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Appends a sort key.
    #[must_use]
    pub fn order_by(mut self, column: &str, order: Order) -> Self {
        self.order_by.push((column.to_owned(), order));
        self
    }

    /// Renders the query for `dialect`.
    #[must_use]
    pub fn build(&self, dialect: &dyn Dialect) -> Statement {
        let mut out = Renderer::new(dialect);
        out.text.push_str("SELECT ");
        if self.columns.is_empty() {
            out.text.push('*');
        } else {
            for (index, column) in self.columns.iter().enumerate() {
                if index > 0 {
                    out.text.push_str(", ");
                }
                out.column(column);
            }
        }
        out.text.push_str(" FROM ");
        out.text.push_str(&self.table.qualified(dialect));
        if let Some(filter) = &self.filter {
            out.text.push_str(" WHERE ");
            filter.render(&mut out);
        }
        for (index, (column, order)) in self.order_by.iter().enumerate() {
            out.text.push_str(if index == 0 { " ORDER BY " } else { ", " });
            out.column(column);
            out.text
                .push_str(if *order == Order::Asc { " ASC" } else { " DESC" });
        }
        Statement {
            text: out.text,
            params: out.params,
        }
    }
}

/// `INSERT INTO table (columns) VALUES (...), (...)`
#[derive(Debug, Clone)]
pub struct Insert {
    table: Table,
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl Insert {
    /// Starts a command inserting into `table`.
    #[must_use]
    pub fn into(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Sets the column list.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| (*c).to_owned()).collect();
        self
    }

    /// Appends one row of values, in column order.
    #[must_use]
    pub fn values(mut self, row: Vec<SqlValue>) -> Self {
        self.rows.push(row);
        self
    }

    /// Renders the command for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns `BuildError` if there are no columns or rows, or a row's width
    /// differs from the column list.
    pub fn build(&self, dialect: &dyn Dialect) -> Result<Statement, BuildError> {
        if self.columns.is_empty() {
            return Err(BuildError::NoColumns {
                table: self.table.name().to_owned(),
            });
        }
        if self.rows.is_empty() {
            return Err(BuildError::NoRows {
                table: self.table.name().to_owned(),
            });
        }
        if let Some((row, values)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != self.columns.len())
        {
            return Err(BuildError::ColumnCountMismatch {
                row,
                expected: self.columns.len(),
                found: values.len(),
            });
        }

        let mut out = Renderer::new(dialect);
        out.text.push_str("INSERT INTO ");
        out.text.push_str(&self.table.qualified(dialect));
        out.text.push_str(" (");
        for (index, column) in self.columns.iter().enumerate() {
            if index > 0 {
                out.text.push_str(", ");
            }
            out.column(column);
        }
        out.text.push_str(") VALUES ");
        for (row_index, row) in self.rows.iter().enumerate() {
            if row_index > 0 {
                out.text.push_str(", ");
            }
            out.text.push('(');
            for (index, value) in row.iter().enumerate() {
                if index > 0 {
                    out.text.push_str(", ");
                }
                out.bind(value.clone());
            }
            out.text.push(')');
        }
        Ok(Statement {
            text: out.text,
            params: out.params,
        })
    }
}
