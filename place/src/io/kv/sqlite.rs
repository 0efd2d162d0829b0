//! SQLite backend.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use super::{KvError, KvStore, RawEntry, effective_prefix, now_ms};

const TABLE_NAME: &str = "kv_store_v1";

/// How long a writer waits on another process's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Store backed by a single SQLite table.
///
/// The connection sits behind a mutex because `rusqlite::Connection` is not
/// `Sync`. The table is created lazily on first use; `CREATE TABLE IF NOT
/// EXISTS` keeps concurrent first callers (including other processes) safe,
/// and the flag only skips the statement once it has succeeded.
#[derive(Debug)]
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
    schema_ready: AtomicBool,
    path: Option<PathBuf>,
}

impl SqliteKvStore {
    /// Open (or create) a database file, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, KvError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| KvError::storage("open", err))?;
        }
        let conn = Connection::open(path).map_err(|err| KvError::storage("open", err))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|err| KvError::storage("open", err))?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            "#,
        )
        .map_err(|err| KvError::storage("open", err))?;
        debug!(path = %path.display(), "opened sqlite store");
        Ok(Self::from_connection(conn, Some(path.to_path_buf())))
    }

    /// Private in-memory database; contents vanish with the store.
    pub fn open_in_memory() -> Result<Self, KvError> {
        let conn = Connection::open_in_memory().map_err(|err| KvError::storage("open", err))?;
        Ok(Self::from_connection(conn, None))
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Self {
        Self {
            conn: Mutex::new(conn),
            schema_ready: AtomicBool::new(false),
            path,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create the backing table if it does not exist yet. Cheap after the
    /// first successful call.
    pub fn init_schema(&self) -> Result<(), KvError> {
        if self.schema_ready.load(Ordering::Acquire) {
            return Ok(());
        }
        let conn = self.lock("init schema")?;
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {TABLE_NAME} (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL,
              updated_at INTEGER NOT NULL
            );
            "#
        ))
        .map_err(|err| KvError::storage("init schema", err))?;
        self.schema_ready.store(true, Ordering::Release);
        info!(table = TABLE_NAME, "kv schema ready");
        Ok(())
    }

    fn lock(&self, op: &'static str) -> Result<MutexGuard<'_, Connection>, KvError> {
        self.conn
            .lock()
            .map_err(|_| KvError::storage(op, "sqlite connection lock poisoned"))
    }

    fn with_conn<R>(
        &self,
        op: &'static str,
        f: impl FnOnce(&Connection) -> rusqlite::Result<R>,
    ) -> Result<R, KvError> {
        self.init_schema()?;
        let conn = self.lock(op)?;
        f(&conn).map_err(|err| KvError::storage(op, err))
    }
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        key: row.get(0)?,
        encoded: row.get(1)?,
        updated_at: row.get(2)?,
    })
}

impl KvStore for SqliteKvStore {
    fn put_encoded(&self, key: &str, encoded: &str) -> Result<(), KvError> {
        let timestamp = now_ms();
        self.with_conn("set", |conn| {
            conn.execute(
                &format!(
                    r#"
                    INSERT INTO {TABLE_NAME} (key, value, updated_at)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE SET
                      value = excluded.value,
                      updated_at = MAX(excluded.updated_at, {TABLE_NAME}.updated_at)
                    "#
                ),
                params![key, encoded, timestamp],
            )
        })?;
        debug!(key, "kv set");
        Ok(())
    }

    fn get_encoded(&self, key: &str) -> Result<Option<RawEntry>, KvError> {
        self.with_conn("get", |conn| {
            conn.query_row(
                &format!("SELECT key, value, updated_at FROM {TABLE_NAME} WHERE key = ?1"),
                params![key],
                row_to_raw,
            )
            .optional()
        })
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        self.with_conn("delete", |conn| {
            conn.execute(
                &format!("DELETE FROM {TABLE_NAME} WHERE key = ?1"),
                params![key],
            )
        })?;
        debug!(key, "kv delete");
        Ok(())
    }

    fn list_encoded(&self, prefix: Option<&str>) -> Result<Vec<RawEntry>, KvError> {
        self.with_conn("list", |conn| match effective_prefix(prefix) {
            // substr() compares with BINARY collation, so the match is exact and
            // case-sensitive, unlike LIKE.
            Some(prefix) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT key, value, updated_at FROM {TABLE_NAME} \
                     WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key"
                ))?;
                let rows = stmt.query_map(params![prefix], row_to_raw)?;
                rows.collect()
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT key, value, updated_at FROM {TABLE_NAME} ORDER BY key"
                ))?;
                let rows = stmt.query_map([], row_to_raw)?;
                rows.collect()
            }
        })
    }
}
