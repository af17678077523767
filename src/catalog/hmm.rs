//! HMM profile catalog and the sub-profile hierarchy.
//!
//! Profiles live in `hmm`; the hierarchy is a separate child -> parent edge
//! table (`subpfam`). A profile has at most one parent and parent chains
//! never cycle: every new edge walks the chain above the proposed parent
//! before it is admitted.

use crate::catalog::reference::HmmModelType;
use crate::core::db;
use crate::core::error::{EntityKind, StoreError};
use crate::core::ids::HmmId;
use crate::core::store::Store;
use rusqlite::{Connection, OptionalExtension, params};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Hmm {
    pub id: HmmId,
    pub accession: Option<String>,
    pub name: String,
    pub model_length: i64,
    pub model_type: HmmModelType,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HmmInput {
    pub accession: Option<String>,
    pub name: String,
    pub model_length: i64,
    pub model_type: HmmModelType,
}

fn row_to_hmm(row: &rusqlite::Row) -> Result<Hmm, rusqlite::Error> {
    let accession: String = row.get(1)?;
    let type_id: i64 = row.get(4)?;
    Ok(Hmm {
        id: row.get(0)?,
        accession: (!accession.is_empty()).then_some(accession),
        name: row.get(2)?,
        model_length: row.get(3)?,
        model_type: HmmModelType::from_id(type_id)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(4, type_id))?,
    })
}

/// Register a profile. `(accession, name, model_length)` must be new; a
/// missing accession is stored as the empty string so it still takes part
/// in the uniqueness check.
pub fn register_hmm(store: &Store, input: &HmmInput) -> Result<HmmId, StoreError> {
    let accession = input.accession.as_deref().unwrap_or("");
    store.broker().with_write("hmm.register", |conn| {
        conn.execute(
            "INSERT INTO hmm(accession, name, model_length, model_type_id) VALUES(?1, ?2, ?3, ?4)",
            params![
                accession,
                input.name,
                input.model_length,
                input.model_type.id()
            ],
        )
        .map_err(|e| {
            db::map_unique(
                e,
                EntityKind::Hmm,
                format!("{}/{}/{}", accession, input.name, input.model_length),
            )
        })?;
        Ok(HmmId(conn.last_insert_rowid()))
    })
}

pub fn get_hmm(store: &Store, id: HmmId) -> Result<Hmm, StoreError> {
    store.broker().with_read(|conn| {
        conn.query_row(
            "SELECT id, accession, name, model_length, model_type_id FROM hmm WHERE id = ?1",
            [id],
            row_to_hmm,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found(EntityKind::Hmm, id))
    })
}

fn parent_of(conn: &Connection, hmm: HmmId) -> Result<Option<HmmId>, rusqlite::Error> {
    conn.query_row(
        "SELECT parent_hmm_id FROM subpfam WHERE hmm_id = ?1",
        [hmm],
        |row| row.get(0),
    )
    .optional()
}

/// Parent chain of `hmm`, immediate parent first.
fn ancestry(conn: &Connection, hmm: HmmId) -> Result<Vec<HmmId>, StoreError> {
    let mut out = Vec::new();
    let mut seen = FxHashSet::default();
    seen.insert(hmm);
    let mut current = hmm;
    while let Some(parent) = parent_of(conn, current)? {
        if !seen.insert(parent) {
            return Err(StoreError::ValidationError(format!(
                "sub-profile chain of hmm {} loops at {}",
                hmm, parent
            )));
        }
        out.push(parent);
        current = parent;
    }
    Ok(out)
}

/// Record `child` as a sub-profile of `parent`.
pub fn link_sub_profile(store: &Store, child: HmmId, parent: HmmId) -> Result<(), StoreError> {
    store.broker().with_write("hmm.link_sub_profile", |conn| {
        db::require_row(conn, "hmm", child.0, EntityKind::Hmm)?;
        db::require_row(conn, "hmm", parent.0, EntityKind::Hmm)?;
        if child == parent {
            return Err(StoreError::SelfReference {
                kind: EntityKind::Hmm,
                id: child.0,
            });
        }
        if ancestry(conn, parent)?.contains(&child) {
            return Err(StoreError::CycleDetected {
                kind: EntityKind::Hmm,
                child: child.0,
                parent: parent.0,
            });
        }
        if let Some(existing) = parent_of(conn, child)? {
            return Err(StoreError::duplicate(
                EntityKind::SubProfileLink,
                format!("hmm {} already under {}", child, existing),
            ));
        }
        conn.execute(
            "INSERT INTO subpfam(hmm_id, parent_hmm_id) VALUES(?1, ?2)",
            params![child, parent],
        )
        .map_err(|e| db::map_unique(e, EntityKind::SubProfileLink, child))?;
        Ok(())
    })
}

/// Ordered ancestors of `hmm` from its immediate parent up to the root.
pub fn resolve_ancestry(store: &Store, hmm: HmmId) -> Result<Vec<HmmId>, StoreError> {
    store.broker().with_read(|conn| {
        db::require_row(conn, "hmm", hmm.0, EntityKind::Hmm)?;
        ancestry(conn, hmm)
    })
}

/// Direct sub-profiles of `parent`, in id order.
pub fn sub_profiles_of(store: &Store, parent: HmmId) -> Result<Vec<HmmId>, StoreError> {
    store.broker().with_read(|conn| {
        db::require_row(conn, "hmm", parent.0, EntityKind::Hmm)?;
        let mut stmt =
            conn.prepare("SELECT hmm_id FROM subpfam WHERE parent_hmm_id = ?1 ORDER BY hmm_id")?;
        let rows = stmt.query_map([parent], |row| row.get(0))?;
        let mut out: Vec<HmmId> = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}
