//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::AppError;

/// Which event store backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local; everything is lost on exit.
    Memory,
    /// `PostgreSQL` via `DATABASE_URL`.
    Postgres,
    /// `SQLite` via `DATABASE_URL`.
    Sqlite,
}

impl StoreBackend {
    /// Short name for logs and the health endpoint.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(AppError::Config(format!(
                "STORE_BACKEND must be memory, postgres or sqlite, got {other:?}"
            ))),
        }
    }
}

/// Everything `main` needs to start the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Event store selection.
    pub store_backend: StoreBackend,
    /// Connection string for relational backends.
    pub database_url: Option<String>,
    /// Pool size for relational backends.
    pub max_connections: u32,
    /// Events table name.
    pub events_table: String,
    /// Events table schema; the dialect default when unset.
    pub events_schema: Option<String>,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl Config {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for invalid or missing values.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for invalid or missing values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store_backend = match var("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => StoreBackend::Memory,
        };
        let database_url = var("DATABASE_URL");
        if store_backend != StoreBackend::Memory && database_url.is_none() {
            return Err(AppError::Config(format!(
                "DATABASE_URL must be set for the {} backend",
                store_backend.name()
            )));
        }
        let max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(value) => value
                .parse()
                .map_err(|e| AppError::Config(format!("DB_MAX_CONNECTIONS must be a valid u32: {e}")))?,
            None => 10,
        };
        let port = match var("PORT") {
            Some(value) => value
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => 3000,
        };

        Ok(Self {
            store_backend,
            database_url,
            max_connections,
            events_table: var("EVENTS_TABLE").unwrap_or_else(|| "events".to_owned()),
            events_schema: var("EVENTS_SCHEMA"),
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port,
        })
    }

    /// The address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_use_memory_store() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.events_table, "events");
        assert_eq!(config.events_schema, None);
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_relational_backend_requires_database_url() {
        let result = config_from(&[("STORE_BACKEND", "postgres")]);

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_sqlite_backend_with_custom_table() {
        let config = config_from(&[
            ("STORE_BACKEND", "SQLite"),
            ("DATABASE_URL", "sqlite://events.db"),
            ("EVENTS_TABLE", "todo_events"),
            ("PORT", "8080"),
        ])
        .unwrap();

        assert_eq!(config.store_backend, StoreBackend::Sqlite);
        assert_eq!(config.events_table, "todo_events");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("PORT", "http")]).is_err());
        assert!(config_from(&[("STORE_BACKEND", "mongo")]).is_err());
        assert!(config_from(&[("DB_MAX_CONNECTIONS", "-1")]).is_err());
    }
}
