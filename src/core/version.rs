//! Schema version marker.
//!
//! - **First open stamps the version**: an empty `schema_version` table gets
//!   the compiled-in [`SCHEMA_VERSION`](crate::core::schemas::SCHEMA_VERSION)
//! - **Mismatch is fatal**: a store written by another schema version is never
//!   touched; the caller gets `VersionMismatch` and must surface it
//! - No migrations are run here.

use crate::core::error::StoreError;
use rusqlite::{Connection, OptionalExtension, params};

pub fn stored_version(conn: &Connection) -> Result<Option<String>, StoreError> {
    let version = conn
        .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(version)
}

/// Stamp `expected` when no version is stored yet, otherwise require equality.
pub fn check_schema_version(conn: &Connection, expected: &str) -> Result<(), StoreError> {
    match stored_version(conn)? {
        None => {
            conn.execute(
                "INSERT INTO schema_version(id, version) VALUES(1, ?1)",
                params![expected],
            )?;
            Ok(())
        }
        Some(found) if found == expected => Ok(()),
        Some(found) => Err(StoreError::VersionMismatch {
            expected: expected.to_string(),
            found,
        }),
    }
}
