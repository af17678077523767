//! Datasets and the BGC records loaded into them.
//!
//! A BGC is created once by the load stage. After that the only mutations are
//! status advancement along the fixed lattice and annotation backfill.

use crate::catalog::reference::{BgcStatus, BgcType};
use crate::core::db;
use crate::core::error::{EntityKind, StoreError};
use crate::core::ids::{BgcId, DatasetId};
use crate::core::store::Store;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
    pub orig_folder: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Bgc {
    pub id: BgcId,
    pub dataset_id: DatasetId,
    pub name: String,
    pub bgc_type: BgcType,
    pub on_contig_edge: bool,
    pub length_nt: i64,
    pub orig_folder: String,
    pub orig_filename: String,
    pub organism: Option<String>,
    pub product: Option<String>,
    pub status: BgcStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BgcInput {
    pub name: String,
    pub bgc_type: BgcType,
    pub on_contig_edge: bool,
    pub length_nt: i64,
    pub orig_folder: String,
    pub orig_filename: String,
    pub product: Option<String>,
    pub organism: Option<String>,
}

const BGC_COLUMNS: &str = "id, dataset_id, name, type_id, on_contig_edge, length_nt, \
                           orig_folder, orig_filename, organism, product, status_id";

fn row_to_dataset(row: &rusqlite::Row) -> Result<Dataset, rusqlite::Error> {
    Ok(Dataset {
        id: row.get(0)?,
        name: row.get(1)?,
        orig_folder: row.get(2)?,
        description: row.get(3)?,
    })
}

fn row_to_bgc(row: &rusqlite::Row) -> Result<Bgc, rusqlite::Error> {
    let type_id: i64 = row.get(3)?;
    let status_id: i64 = row.get(10)?;
    Ok(Bgc {
        id: row.get(0)?,
        dataset_id: row.get(1)?,
        name: row.get(2)?,
        bgc_type: BgcType::from_id(type_id)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(3, type_id))?,
        on_contig_edge: row.get(4)?,
        length_nt: row.get(5)?,
        orig_folder: row.get(6)?,
        orig_filename: row.get(7)?,
        organism: row.get(8)?,
        product: row.get(9)?,
        status: BgcStatus::from_id(status_id)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(10, status_id))?,
    })
}

pub fn create_dataset(
    store: &Store,
    name: &str,
    orig_folder: &str,
    description: &str,
) -> Result<DatasetId, StoreError> {
    store.broker().with_write("dataset.create", |conn| {
        conn.execute(
            "INSERT INTO dataset(name, orig_folder, description) VALUES(?1, ?2, ?3)",
            params![name, orig_folder, description],
        )
        .map_err(|e| db::map_unique(e, EntityKind::Dataset, name))?;
        Ok(DatasetId(conn.last_insert_rowid()))
    })
}

pub fn get_dataset(store: &Store, id: DatasetId) -> Result<Dataset, StoreError> {
    store.broker().with_read(|conn| {
        conn.query_row(
            "SELECT id, name, orig_folder, description FROM dataset WHERE id = ?1",
            [id],
            row_to_dataset,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found(EntityKind::Dataset, id))
    })
}

pub fn dataset_by_name(store: &Store, name: &str) -> Result<Option<Dataset>, StoreError> {
    store.broker().with_read(|conn| {
        let dataset = conn
            .query_row(
                "SELECT id, name, orig_folder, description FROM dataset WHERE name = ?1",
                [name],
                row_to_dataset,
            )
            .optional()?;
        Ok(dataset)
    })
}

pub fn list_datasets(store: &Store) -> Result<Vec<Dataset>, StoreError> {
    store.broker().with_read(|conn| {
        let mut stmt =
            conn.prepare("SELECT id, name, orig_folder, description FROM dataset ORDER BY id")?;
        let rows = stmt.query_map([], row_to_dataset)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

/// Register a BGC under `dataset`. New BGCs start at `LOADED`.
pub fn register_bgc(
    store: &Store,
    dataset: DatasetId,
    input: &BgcInput,
) -> Result<BgcId, StoreError> {
    store.broker().with_write("bgc.register", |conn| {
        db::require_row(conn, "dataset", dataset.0, EntityKind::Dataset)?;
        conn.execute(
            "INSERT INTO bgc(dataset_id, name, type_id, on_contig_edge, length_nt,
                             orig_folder, orig_filename, organism, product, status_id)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                dataset,
                input.name,
                input.bgc_type.id(),
                input.on_contig_edge,
                input.length_nt,
                input.orig_folder,
                input.orig_filename,
                input.organism,
                input.product,
                BgcStatus::Loaded.id()
            ],
        )
        .map_err(|e| {
            db::map_unique(
                e,
                EntityKind::Bgc,
                format!(
                    "dataset {} source {}/{}",
                    dataset, input.orig_folder, input.orig_filename
                ),
            )
        })?;
        Ok(BgcId(conn.last_insert_rowid()))
    })
}

pub fn get_bgc(store: &Store, id: BgcId) -> Result<Bgc, StoreError> {
    store.broker().with_read(|conn| {
        let sql = format!("SELECT {} FROM bgc WHERE id = ?1", BGC_COLUMNS);
        conn.query_row(&sql, [id], row_to_bgc)
            .optional()?
            .ok_or_else(|| StoreError::not_found(EntityKind::Bgc, id))
    })
}

/// BGCs of a dataset in id (= insertion) order.
pub fn list_by_dataset(store: &Store, dataset: DatasetId) -> Result<Vec<Bgc>, StoreError> {
    store.broker().with_read(|conn| {
        db::require_row(conn, "dataset", dataset.0, EntityKind::Dataset)?;
        let sql = format!(
            "SELECT {} FROM bgc WHERE dataset_id = ?1 ORDER BY id",
            BGC_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([dataset], row_to_bgc)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

pub(crate) fn read_status(conn: &Connection, bgc: BgcId) -> Result<BgcStatus, StoreError> {
    let status_id: i64 = conn
        .query_row("SELECT status_id FROM bgc WHERE id = ?1", [bgc], |row| {
            row.get(0)
        })
        .optional()?
        .ok_or_else(|| StoreError::not_found(EntityKind::Bgc, bgc))?;
    BgcStatus::from_id(status_id).ok_or_else(|| {
        StoreError::ValidationError(format!("bgc {} has unknown status id {}", bgc, status_id))
    })
}

pub fn get_status(store: &Store, bgc: BgcId) -> Result<BgcStatus, StoreError> {
    store.broker().with_read(|conn| read_status(conn, bgc))
}

/// Move `bgc` to `new_status`, which must be the immediate successor of its
/// current status. Read and update happen in one write transaction.
pub fn advance_status(store: &Store, bgc: BgcId, new_status: BgcStatus) -> Result<(), StoreError> {
    store.broker().with_write("bgc.advance_status", |conn| {
        let current = read_status(conn, bgc)?;
        if current.successor() != Some(new_status) {
            return Err(StoreError::InvalidTransition {
                subject: format!("bgc {}", bgc),
                from: current.name().to_string(),
                to: new_status.name().to_string(),
            });
        }
        conn.execute(
            "UPDATE bgc SET status_id = ?1 WHERE id = ?2 AND status_id = ?3",
            params![new_status.id(), bgc, current.id()],
        )?;
        Ok(())
    })
}

/// Fill in organism/product annotations. `None` leaves the stored value as is.
pub fn backfill_annotation(
    store: &Store,
    bgc: BgcId,
    organism: Option<&str>,
    product: Option<&str>,
) -> Result<(), StoreError> {
    store.broker().with_write("bgc.backfill_annotation", |conn| {
        db::require_row(conn, "bgc", bgc.0, EntityKind::Bgc)?;
        conn.execute(
            "UPDATE bgc SET organism = COALESCE(?1, organism), product = COALESCE(?2, product)
             WHERE id = ?3",
            params![organism, product, bgc],
        )?;
        Ok(())
    })
}
