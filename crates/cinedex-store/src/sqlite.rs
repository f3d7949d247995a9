//! `SQLite`-backed key-value store.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use tokio::sync::Mutex;

use crate::kv::KeyValueStore;
use crate::paths::database_file;

/// Current schema version.
const CURRENT_VERSION: u32 = 1;

/// Key-value store persisted in a local `SQLite` database.
///
/// The single connection sits behind a tokio mutex; each call locks it
/// for the duration of one statement, which keeps single-key operations
/// atomic without any cross-key transaction.
#[derive(Debug, Clone)]
pub struct SqliteKv {
    /// Shared database connection.
    conn: Arc<Mutex<Connection>>,
}

/// Opens (or creates) the store database and runs migrations.
///
/// The file lives at [`crate::paths::database_file`]'s location.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrations fail.
pub fn open_store(dir: Option<&Path>) -> Result<SqliteKv> {
    let db_path = database_file(dir).context("failed to resolve database path")?;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    run_migrations(&conn).context("database migration failed")?;

    Ok(SqliteKv {
        conn: Arc::new(Mutex::new(conn)),
    })
}

/// Runs database migrations up to `CURRENT_VERSION`.
fn run_migrations(conn: &Connection) -> Result<()> {
    let version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version")?;

    if version < 1 {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key    TEXT PRIMARY KEY,
                value  TEXT NOT NULL
            );",
        )
        .context("failed to create kv table")?;
    }

    conn.pragma_update(None, "user_version", CURRENT_VERSION)
        .context("failed to update user_version")?;

    Ok(())
}

impl SqliteKv {
    /// Wraps an already-open connection (tests).
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

impl KeyValueStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()
        .with_context(|| format!("failed to read key {key}"))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )
        .with_context(|| format!("failed to write key {key}"))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM kv WHERE key = ?1", [key])
            .with_context(|| format!("failed to remove key {key}"))?;
        Ok(())
    }
}
