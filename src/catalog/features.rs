//! Feature matrix: one integer per (BGC, HMM), written once by feature extraction.

use crate::catalog::dataset::{self, read_status};
use crate::catalog::reference::BgcStatus;
use crate::core::db;
use crate::core::error::{EntityKind, StoreError};
use crate::core::ids::{BgcId, DatasetId, HmmId};
use crate::core::store::Store;
use rayon::prelude::*;
use rusqlite::{Connection, params};
use std::collections::BTreeMap;

/// Sparse feature vector; HMMs without an entry count as zero.
pub type FeatureVector = BTreeMap<HmmId, i64>;

fn insert_feature(conn: &Connection, bgc: BgcId, hmm: HmmId, value: i64) -> Result<(), StoreError> {
    db::require_row(conn, "hmm", hmm.0, EntityKind::Hmm)?;
    conn.execute(
        "INSERT INTO bgc_features(bgc_id, hmm_id, value) VALUES(?1, ?2, ?3)",
        params![bgc, hmm, value],
    )
    .map_err(|e| db::map_unique(e, EntityKind::Feature, format!("bgc {} hmm {}", bgc, hmm)))?;
    Ok(())
}

fn check_status_at_least(
    conn: &Connection,
    bgc: BgcId,
    required: BgcStatus,
) -> Result<(), StoreError> {
    let actual = read_status(conn, bgc)?;
    if actual < required {
        return Err(StoreError::StatusPrecondition {
            bgc: bgc.0,
            required: required.name().to_string(),
            actual: actual.name().to_string(),
        });
    }
    Ok(())
}

/// Guard for bulk writers: fails unless `bgc` has reached `required`.
pub fn require_status_at_least(
    store: &Store,
    bgc: BgcId,
    required: BgcStatus,
) -> Result<(), StoreError> {
    store
        .broker()
        .with_read(|conn| check_status_at_least(conn, bgc, required))
}

/// Store one feature value. An existing value for the pair is never replaced.
pub fn set_feature_value(
    store: &Store,
    bgc: BgcId,
    hmm: HmmId,
    value: i64,
) -> Result<(), StoreError> {
    store.broker().with_write("features.set", |conn| {
        db::require_row(conn, "bgc", bgc.0, EntityKind::Bgc)?;
        insert_feature(conn, bgc, hmm, value)
    })
}

/// Store a BGC's whole feature vector in one transaction. The BGC must be at
/// least `SUBPFAM_SCANNED`; any duplicate aborts the whole write.
pub fn write_feature_vector(
    store: &Store,
    bgc: BgcId,
    values: &[(HmmId, i64)],
) -> Result<(), StoreError> {
    store.broker().with_write("features.write_vector", |conn| {
        check_status_at_least(conn, bgc, BgcStatus::SubpfamScanned)?;
        for (hmm, value) in values {
            insert_feature(conn, bgc, *hmm, *value)?;
        }
        Ok(())
    })
}

fn read_vector(conn: &Connection, bgc: BgcId) -> Result<FeatureVector, StoreError> {
    db::require_row(conn, "bgc", bgc.0, EntityKind::Bgc)?;
    let mut stmt = conn.prepare("SELECT hmm_id, value FROM bgc_features WHERE bgc_id = ?1")?;
    let rows = stmt.query_map([bgc], |row| {
        Ok((row.get::<_, HmmId>(0)?, row.get::<_, i64>(1)?))
    })?;
    let mut out = FeatureVector::new();
    for r in rows {
        let (hmm, value) = r?;
        out.insert(hmm, value);
    }
    Ok(out)
}

pub fn feature_vector(store: &Store, bgc: BgcId) -> Result<FeatureVector, StoreError> {
    store.broker().with_read(|conn| read_vector(conn, bgc))
}

/// Feature vectors of every BGC in `dataset`, in BGC id order.
/// Vectors are read in parallel, each on its own connection.
pub fn dataset_feature_matrix(
    store: &Store,
    dataset: DatasetId,
) -> Result<Vec<(BgcId, FeatureVector)>, StoreError> {
    let bgc_ids: Vec<BgcId> = dataset::list_by_dataset(store, dataset)?
        .into_iter()
        .map(|b| b.id)
        .collect();

    bgc_ids
        .par_iter()
        .map(|bgc| feature_vector(store, *bgc).map(|v| (*bgc, v)))
        .collect()
}
