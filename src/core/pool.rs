//! SQLite connection pool with read/write separation and retry logic.
//!
//! - Maintains a **write mutex** per DB for serialized in-process write access
//! - Every write runs inside one `BEGIN IMMEDIATE` transaction, which takes the
//!   reserved lock up front so check-then-insert is atomic across processes too
//! - Creates fresh **read connections** per operation (no mutex, concurrent via WAL)
//!
//! Connections are NOT pooled (opened fresh each time) to avoid WAL/SHM file handle
//! conflicts between independent pipeline processes sharing one store.

use crate::core::db;
use crate::core::error::StoreError;
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::Duration;

/// Base delay for exponential backoff (milliseconds).
const BASE_DELAY_MS: u64 = 100;
/// Maximum delay cap (milliseconds).
const MAX_DELAY_MS: u64 = 5_000;

/// Per-database entry holding a write mutex for serialized write access.
struct PoolEntry {
    write_lock: Mutex<()>,
    db_path: PathBuf,
}

/// Timeouts and retry budget applied to every connection the pool opens.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub write_busy_timeout_secs: u32,
    pub read_busy_timeout_secs: u32,
    pub max_busy_retries: u32,
}

pub struct SqlitePool {
    entries: Mutex<HashMap<PathBuf, &'static PoolEntry>>,
}

impl SqlitePool {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn get_entry(&self, db_path: &Path) -> Result<&'static PoolEntry, StoreError> {
        let canonical = db_path.to_path_buf();
        let mut entries = self.entries.lock().map_err(|_| {
            StoreError::ValidationError("SqlitePool entries lock poisoned".to_string())
        })?;
        if let Some(entry) = entries.get(&canonical) {
            return Ok(*entry);
        }
        let entry = Box::leak(Box::new(PoolEntry {
            write_lock: Mutex::new(()),
            db_path: canonical.clone(),
        }));
        entries.insert(canonical, entry);
        Ok(entry)
    }

    /// Execute a closure inside one immediate write transaction.
    /// The transaction commits when the closure returns `Ok` and rolls back otherwise,
    /// so a failed operation never leaves a partial row behind.
    pub fn with_write<F, R>(
        &self,
        db_path: &Path,
        settings: PoolSettings,
        f: F,
    ) -> Result<R, StoreError>
    where
        F: FnOnce(&Connection) -> Result<R, StoreError>,
    {
        let entry = self.get_entry(db_path)?;
        let _guard = entry
            .write_lock
            .lock()
            .map_err(|_| StoreError::ValidationError("Pool write lock poisoned".to_string()))?;

        let conn = retry_on_busy(settings.max_busy_retries, || {
            db::db_connect(&entry.db_path, settings.write_busy_timeout_secs)
        })?;
        retry_on_busy(settings.max_busy_retries, || {
            conn.execute_batch("BEGIN IMMEDIATE;")
                .map_err(StoreError::RusqliteError)
        })?;

        match f(&conn) {
            Ok(value) => match conn.execute_batch("COMMIT;") {
                Ok(()) => Ok(value),
                Err(e) => {
                    let _ = conn.execute_batch("ROLLBACK;");
                    Err(StoreError::RusqliteError(e))
                }
            },
            Err(e) => {
                conn.execute_batch("ROLLBACK;")
                    .map_err(StoreError::RusqliteError)?;
                Err(e)
            }
        }
    }

    /// Execute a closure with a read connection (no mutex serialization).
    /// WAL mode allows concurrent readers across threads and processes.
    pub fn with_read<F, R>(
        &self,
        db_path: &Path,
        settings: PoolSettings,
        f: F,
    ) -> Result<R, StoreError>
    where
        F: FnOnce(&Connection) -> Result<R, StoreError>,
    {
        let conn = retry_on_busy(settings.max_busy_retries, || {
            db::db_connect(db_path, settings.read_busy_timeout_secs)
        })?;

        f(&conn)
    }
}

/// Retry a closure on `SQLITE_BUSY` / `DatabaseBusy` with exponential backoff.
fn retry_on_busy<F, R>(max_retries: u32, mut f: F) -> Result<R, StoreError>
where
    F: FnMut() -> Result<R, StoreError>,
{
    let mut attempt = 0u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) if db::is_busy(&e) && attempt < max_retries => {
                attempt += 1;
                thread::sleep(backoff_delay(attempt));
            }
            Err(e) => return Err(e),
        }
    }
}

/// Delay before retry number `attempt` (1-based), capped at `MAX_DELAY_MS`.
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(BASE_DELAY_MS.saturating_mul(factor).min(MAX_DELAY_MS))
}

/// Global pool instance (same lifetime as the process).
pub fn global_pool() -> &'static SqlitePool {
    static POOL: OnceLock<SqlitePool> = OnceLock::new();
    POOL.get_or_init(SqlitePool::new)
}
