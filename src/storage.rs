use std::error::Error;
use std::fmt;
use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Persisted entity-family keys. Each key holds one JSON array value,
/// mutated read-modify-write.
pub const KEY_RECOMMENDATIONS: &str = "recommendations";
pub const KEY_COLLECTIONS: &str = "collections";
pub const KEY_ROUTES: &str = "routes";
pub const KEY_TRIPS: &str = "trips";
pub const KEY_USER_PLACES: &str = "user_places";
pub const KEY_PROXIMITY_SETTINGS: &str = "proximity_settings";

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 1] = [Migration {
    version: 1,
    name: "baseline_store_schema_v1",
    sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#,
}];

/// Local storage: the single source of truth for every entity family.
/// All reads and writes are synchronous; a mutation has fully persisted
/// before its event is emitted.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        ensure_parent_dir(path)?;
        let mut conn = Connection::open(path)?;
        configure_for_speed(&conn)?;
        apply_migrations(&mut conn)?;
        let storage = Storage { conn };
        storage.set_meta("schema_version", &CURRENT_SCHEMA_VERSION.to_string())?;
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let mut conn = Connection::open_in_memory()?;
        apply_migrations(&mut conn)?;
        let storage = Storage { conn };
        storage.set_meta("schema_version", &CURRENT_SCHEMA_VERSION.to_string())?;
        Ok(storage)
    }

    /// Load the JSON array stored under `key`; a missing key is an
    /// empty list, not an error.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StorageError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the JSON array stored under `key`.
    pub fn save<T: Serialize>(&self, key: &str, values: &[T]) -> Result<(), StorageError> {
        let json = serde_json::to_string(values)?;
        self.conn.execute(
            r#"
INSERT INTO store (key, value, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
"#,
            params![key, json, now_utc_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            r#"
INSERT INTO meta (key, value)
VALUES (?1, ?2)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
            params![key, value],
        )?;
        Ok(())
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), StorageError> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn configure_for_speed(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;
        if already_applied.is_some() {
            continue;
        }
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.commit()
}

pub fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("RFC3339 formatting for UTC timestamp should never fail")
}

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Db(rusqlite::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "I/O error: {}", err),
            StorageError::Db(err) => write!(f, "database error: {}", err),
            StorageError::Serialize(err) => write!(f, "failed to (de)serialize store value: {}", err),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StorageError::Io(err) => Some(err),
            StorageError::Db(err) => Some(err),
            StorageError::Serialize(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Io(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        StorageError::Db(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        StorageError::Serialize(value)
    }
}

#[cfg(test)]
mod tests;
