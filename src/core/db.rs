use crate::core::error::{EntityKind, StoreError};
use rusqlite::{Connection, ffi};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub fn db_connect(db_path: &Path, busy_timeout_secs: u32) -> Result<Connection, StoreError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(u64::from(busy_timeout_secs)))
        .map_err(StoreError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(StoreError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(StoreError::RusqliteError)?;
    Ok(conn)
}

/// Translate a UNIQUE / PRIMARY KEY violation into a typed duplicate error.
/// Every other failure is passed through unchanged.
pub fn map_unique(err: rusqlite::Error, kind: EntityKind, key: impl fmt::Display) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            StoreError::duplicate(kind, key)
        }
        _ => StoreError::RusqliteError(err),
    }
}

pub fn is_busy(err: &StoreError) -> bool {
    match err {
        StoreError::RusqliteError(rusqlite::Error::SqliteFailure(code, _)) => matches!(
            code.code,
            rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
        ),
        _ => false,
    }
}

/// Existence check used before inserts so a dangling reference surfaces as
/// `NotFound` for the referenced family instead of a bare FK failure.
pub fn require_row(
    conn: &Connection,
    table: &str,
    id: i64,
    kind: EntityKind,
) -> Result<(), StoreError> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table);
    let exists: bool = conn.query_row(&sql, [id], |row| row.get(0))?;
    if exists {
        Ok(())
    } else {
        Err(StoreError::not_found(kind, id))
    }
}
