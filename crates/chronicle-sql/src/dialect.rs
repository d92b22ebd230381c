//! SQL dialects.

use std::fmt::Debug;

/// The parts of SQL syntax that differ between engines.
pub trait Dialect: Debug + Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// Quotes one identifier, escaping embedded quote characters.
    fn quote_identifier(&self, identifier: &str) -> String;

    /// Schema used when a table does not name one.
    fn default_schema(&self) -> Option<&'static str>;

    /// Placeholder for the parameter at `position` (1-based).
    fn placeholder(&self, position: usize) -> String;
}

fn quote_with(identifier: &str, open: char, close: char) -> String {
    let escaped = identifier.replace(close, &format!("{close}{close}"));
    format!("{open}{escaped}{close}")
}

/// `PostgreSQL`: `"ident"`, schema `public`, `$n` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        quote_with(identifier, '"', '"')
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("public")
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${position}")
    }
}

/// SQL Server: `[ident]`, schema `dbo`, `@pn` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        quote_with(identifier, '[', ']')
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("dbo")
    }

    fn placeholder(&self, position: usize) -> String {
        format!("@p{position}")
    }
}

/// `SQLite`: `"ident"`, no schema, `?n` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        quote_with(identifier, '"', '"')
    }

    fn default_schema(&self) -> Option<&'static str> {
        None
    }

    fn placeholder(&self, position: usize) -> String {
        format!("?{position}")
    }
}
