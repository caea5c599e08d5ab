//! [`SqliteStore`]: the connection owner behind every storage operation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::sqlite::schema::{CURRENT_SCHEMA_VERSION, DEFAULT_SETTINGS, SCHEMA_STATEMENTS};
use crate::sqlite::time::format_datetime;

/// Connection pragmas applied to every new connection.
const PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA foreign_keys = ON;
     PRAGMA busy_timeout = 5000;";

/// The quest database.
///
/// One connection sits behind a `Mutex`, so every operation (and every
/// completion transaction) on a shared store runs one at a time. Other
/// processes opening the same file are held off by SQLite's own locking.
/// Completions for different users therefore serialize too: SQLite admits a
/// single writer per file, and each completion holds it for its whole
/// transaction.
pub struct SqliteStore {
    pub(crate) conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens the database file at `path`, creating and initializing it if
    /// needed.
    ///
    /// Fails with [`StorageError::Migration`] if the file was written by a
    /// newer schema version.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening quest database");
        let conn = Connection::open(path).map_err(|e| {
            StorageError::Connection(format!("failed to open {}: {e}", path.display()))
        })?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        debug!("opening in-memory quest database");
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("in-memory database: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(PRAGMAS)
            .map_err(|e| StorageError::Connection(format!("failed to set pragmas: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// The schema version stamped in `metadata`, or `None` on a blank file.
    pub fn schema_version(&self) -> Result<Option<i32>> {
        let conn = self.lock_conn()?;
        stored_version(&conn)
    }

    /// Brings the file up to [`CURRENT_SCHEMA_VERSION`] in one transaction:
    /// tables, views, default settings, then the version stamp.
    ///
    /// Default settings use `INSERT OR IGNORE`, so values changed by
    /// `quest settings set` or `quest init` survive a re-run.
    pub(crate) fn init_schema(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        match stored_version(&conn)? {
            Some(v) if v == CURRENT_SCHEMA_VERSION => {
                debug!(version = v, "schema up to date");
                return Ok(());
            }
            Some(v) if v > CURRENT_SCHEMA_VERSION => {
                return Err(StorageError::Migration {
                    name: "schema_version".into(),
                    reason: format!(
                        "database is at version {v}, this build supports up to {CURRENT_SCHEMA_VERSION}"
                    ),
                });
            }
            _ => {}
        }

        let tx = conn.unchecked_transaction()?;
        for (i, stmt) in SCHEMA_STATEMENTS.iter().enumerate() {
            tx.execute_batch(stmt).map_err(|e| StorageError::Migration {
                name: format!("schema statement {}", i + 1),
                reason: e.to_string(),
            })?;
        }

        let now = format_datetime(&chrono::Utc::now());
        for &(key, value, setting_type, description) in DEFAULT_SETTINGS {
            tx.execute(
                "INSERT OR IGNORE INTO app_settings
                    (setting_key, setting_value, setting_type, description, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![key, value, setting_type, description, now],
            )
            .map_err(|e| StorageError::Migration {
                name: format!("default setting {key}"),
                reason: e.to_string(),
            })?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
            params![CURRENT_SCHEMA_VERSION.to_string()],
        )?;
        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("schema commit: {e}")))?;

        info!(version = CURRENT_SCHEMA_VERSION, "schema initialized");
        Ok(())
    }

    /// Locks the shared connection.
    pub(crate) fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Connection(format!("mutex poisoned: {e}")))
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

/// Reads `metadata.schema_version`; a missing table counts as a blank file.
fn stored_version(conn: &Connection) -> Result<Option<i32>> {
    let has_metadata: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'metadata'",
        [],
        |row| row.get(0),
    )?;
    if !has_metadata {
        return Ok(None);
    }
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(raw.and_then(|v| v.trim().parse().ok()))
}
