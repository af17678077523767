use crate::core::error::StoreError;
use crate::core::pool::{self, PoolSettings};
use crate::core::time;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The DB Broker is the single path through which catalog operations reach SQLite.
/// Writes are serialized through the pool and leave one audit line each.
pub struct DbBroker {
    db_path: PathBuf,
    audit_log_path: Option<PathBuf>,
    actor: String,
    settings: PoolSettings,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DbBroker {
    pub fn new(
        db_path: PathBuf,
        audit_log_path: Option<PathBuf>,
        actor: &str,
        settings: PoolSettings,
    ) -> Self {
        Self {
            db_path,
            audit_log_path,
            actor: actor.to_string(),
            settings,
        }
    }

    /// Run `f` inside one write transaction and record the outcome.
    ///
    /// The success line is appended before `COMMIT`: if it cannot be written
    /// the transaction rolls back, so an `Err` never hides stored rows.
    /// Failures are recorded after rollback; the operation's own error is
    /// returned even when that line cannot be written.
    pub fn with_write<F, R>(&self, op_name: &str, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&Connection) -> Result<R, StoreError>,
    {
        let mut body_ok = false;
        let mut audited = false;
        let result = pool::global_pool().with_write(&self.db_path, self.settings, |conn| {
            let value = f(conn)?;
            body_ok = true;
            self.log_event(op_name, "success", None)?;
            audited = true;
            Ok(value)
        });

        if let Err(e) = &result {
            // An audit failure already failed once; don't try the log again.
            let audit_failed = body_ok && !audited;
            if !audit_failed {
                let _ = self.log_event(op_name, "error", Some(e.to_string()));
            }
        }

        result
    }

    pub fn with_read<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&Connection) -> Result<R, StoreError>,
    {
        pool::global_pool().with_read(&self.db_path, self.settings, f)
    }

    fn log_event(
        &self,
        op: &str,
        status: &str,
        error: Option<String>,
    ) -> Result<(), StoreError> {
        let Some(audit_log_path) = &self.audit_log_path else {
            return Ok(());
        };

        let ev = BrokerEvent {
            ts: time::stamp(),
            event_id: time::new_event_id(),
            actor: self.actor.clone(),
            op: op.to_string(),
            db_id: db_id(&self.db_path),
            status: status.to_string(),
            error,
        };

        // One write per line keeps concurrent appenders from interleaving.
        let mut line = serde_json::to_string(&ev)?;
        line.push('\n');
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(audit_log_path)
            .map_err(StoreError::IoError)?;
        f.write_all(line.as_bytes()).map_err(StoreError::IoError)?;
        Ok(())
    }
}

fn db_id(db_path: &Path) -> String {
    db_path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Parse the audit trail written by [`DbBroker`].
pub fn read_audit_log(path: &Path) -> Result<Vec<BrokerEvent>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path).map_err(StoreError::IoError)?;
    let mut events = Vec::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        events.push(serde_json::from_str(line)?);
    }
    Ok(events)
}
