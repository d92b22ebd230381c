//! Event table layout and DDL.
//!
//! Every engine stores the same columns. The stream key
//! `(aggregate_type, aggregate_id, version)` is unique, which is what turns a
//! concurrent write into a version conflict.

use chronicle_sql::{Dialect, PostgresDialect, SqlServerDialect, SqliteDialect, Table};

/// Default events table name.
pub const DEFAULT_EVENTS_TABLE: &str = "events";

/// Columns written on insert, in bind order.
pub const INSERT_COLUMNS: [&str; 9] = [
    "id",
    "actor_id",
    "occurred_on",
    "version",
    "delete_action",
    "aggregate_type",
    "aggregate_id",
    "event_type",
    "event_data",
];

/// Columns read back, the insert columns plus the storage sequence.
pub const SELECT_COLUMNS: [&str; 10] = [
    "storage_seq",
    "id",
    "actor_id",
    "occurred_on",
    "version",
    "delete_action",
    "aggregate_type",
    "aggregate_id",
    "event_type",
    "event_data",
];

struct Names {
    table: String,
    stream_index: String,
    aggregate_index: String,
    type_index: String,
}

fn names(dialect: &dyn Dialect, table: &Table) -> Names {
    let index = |suffix: &str| dialect.quote_identifier(&format!("{}_{suffix}", table.name()));
    Names {
        table: table.qualified(dialect),
        stream_index: index("stream_version"),
        aggregate_index: index("aggregate_id"),
        type_index: index("event_type"),
    }
}

/// `PostgreSQL` DDL for `table`.
#[must_use]
pub fn postgres(table: &Table) -> String {
    let n = names(&PostgresDialect, table);
    format!(
        r"
CREATE TABLE IF NOT EXISTS {table} (
    storage_seq    BIGSERIAL PRIMARY KEY,
    id             UUID NOT NULL UNIQUE,
    actor_id       TEXT,
    occurred_on    TIMESTAMPTZ NOT NULL,
    version        BIGINT NOT NULL,
    delete_action  SMALLINT NOT NULL DEFAULT 0,
    aggregate_type VARCHAR(255) NOT NULL,
    aggregate_id   VARCHAR(255) NOT NULL,
    event_type     VARCHAR(255) NOT NULL,
    event_data     TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS {stream}
    ON {table} (aggregate_type, aggregate_id, version);

CREATE INDEX IF NOT EXISTS {aggregate}
    ON {table} (aggregate_id);

CREATE INDEX IF NOT EXISTS {event_type}
    ON {table} (event_type);
",
        table = n.table,
        stream = n.stream_index,
        aggregate = n.aggregate_index,
        event_type = n.type_index,
    )
}

/// `SQLite` DDL for `table`. UUIDs and timestamps are stored as text.
#[must_use]
pub fn sqlite(table: &Table) -> String {
    let n = names(&SqliteDialect, table);
    format!(
        r"
CREATE TABLE IF NOT EXISTS {table} (
    storage_seq    INTEGER PRIMARY KEY AUTOINCREMENT,
    id             TEXT NOT NULL UNIQUE,
    actor_id       TEXT,
    occurred_on    TEXT NOT NULL,
    version        INTEGER NOT NULL,
    delete_action  INTEGER NOT NULL DEFAULT 0,
    aggregate_type TEXT NOT NULL,
    aggregate_id   TEXT NOT NULL,
    event_type     TEXT NOT NULL,
    event_data     TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS {stream}
    ON {table} (aggregate_type, aggregate_id, version);

CREATE INDEX IF NOT EXISTS {aggregate}
    ON {table} (aggregate_id);

CREATE INDEX IF NOT EXISTS {event_type}
    ON {table} (event_type);
",
        table = n.table,
        stream = n.stream_index,
        aggregate = n.aggregate_index,
        event_type = n.type_index,
    )
}

/// SQL Server DDL for `table`.
#[must_use]
pub fn sql_server(table: &Table) -> String {
    let n = names(&SqlServerDialect, table);
    format!(
        r"
IF OBJECT_ID(N'{table}', N'U') IS NULL
BEGIN
    CREATE TABLE {table} (
        storage_seq    BIGINT IDENTITY(1,1) PRIMARY KEY,
        id             UNIQUEIDENTIFIER NOT NULL UNIQUE,
        actor_id       NVARCHAR(255) NULL,
        occurred_on    DATETIMEOFFSET NOT NULL,
        version        BIGINT NOT NULL,
        delete_action  SMALLINT NOT NULL DEFAULT 0,
        aggregate_type NVARCHAR(255) NOT NULL,
        aggregate_id   NVARCHAR(255) NOT NULL,
        event_type     NVARCHAR(255) NOT NULL,
        event_data     NVARCHAR(MAX) NOT NULL
    );
    CREATE UNIQUE INDEX {stream} ON {table} (aggregate_type, aggregate_id, version);
    CREATE INDEX {aggregate} ON {table} (aggregate_id);
    CREATE INDEX {event_type} ON {table} (event_type);
END
",
        table = n.table,
        stream = n.stream_index,
        aggregate = n.aggregate_index,
        event_type = n.type_index,
    )
}
