//! Run ledger: one row per pipeline run, advanced through [`RunStatus`].

use crate::catalog::reference::RunStatus;
use crate::core::error::{EntityKind, StoreError};
use crate::core::ids::RunId;
use crate::core::store::Store;
use crate::core::time;
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Run {
    pub id: RunId,
    pub status: RunStatus,
    /// Program parameters the run was started with.
    pub params: serde_json::Value,
    pub created_at: String,
    pub updated_at: String,
}

pub fn create_run(store: &Store, run_params: &serde_json::Value) -> Result<RunId, StoreError> {
    let params_json = serde_json::to_string(run_params)?;
    let now = time::stamp();
    store.broker().with_write("run.create", |conn| {
        conn.execute(
            "INSERT INTO run(status_id, params, created_at, updated_at) VALUES(?1, ?2, ?3, ?3)",
            params![RunStatus::RunStarted.id(), params_json, now],
        )?;
        Ok(RunId(conn.last_insert_rowid()))
    })
}

pub fn get_run(store: &Store, id: RunId) -> Result<Run, StoreError> {
    let row = store.broker().with_read(|conn| {
        conn.query_row(
            "SELECT status_id, params, created_at, updated_at FROM run WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found(EntityKind::Run, id))
    })?;

    let (status_id, params_json, created_at, updated_at) = row;
    let status = RunStatus::from_id(status_id).ok_or_else(|| {
        StoreError::ValidationError(format!("run {} has unknown status id {}", id, status_id))
    })?;
    Ok(Run {
        id,
        status,
        params: serde_json::from_str(&params_json)?,
        created_at,
        updated_at,
    })
}

/// Move `run` to `new_status`; only the immediate successor is accepted.
pub fn advance_run_status(store: &Store, run: RunId, new_status: RunStatus) -> Result<(), StoreError> {
    let now = time::stamp();
    store.broker().with_write("run.advance_status", |conn| {
        let status_id: i64 = conn
            .query_row("SELECT status_id FROM run WHERE id = ?1", [run], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| StoreError::not_found(EntityKind::Run, run))?;
        let current = RunStatus::from_id(status_id).ok_or_else(|| {
            StoreError::ValidationError(format!("run {} has unknown status id {}", run, status_id))
        })?;
        if current.successor() != Some(new_status) {
            return Err(StoreError::InvalidTransition {
                subject: format!("run {}", run),
                from: current.name().to_string(),
                to: new_status.name().to_string(),
            });
        }
        conn.execute(
            "UPDATE run SET status_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![new_status.id(), now, run],
        )?;
        Ok(())
    })
}
