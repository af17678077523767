//! Taxonomic placement and chemical classification of BGCs.
//!
//! Both BGC link tables are insert-if-absent: classifying a BGC again with
//! the same taxon or subclass succeeds and reports that nothing new was linked.

use crate::catalog::reference::{self, ChemSubclass, TaxonRank};
use crate::core::db;
use crate::core::error::{EntityKind, StoreError};
use crate::core::ids::{BgcId, SubclassId, TaxonId};
use crate::core::store::Store;
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Taxon {
    pub id: TaxonId,
    pub rank: TaxonRank,
    pub name: String,
}

pub fn register_taxon(store: &Store, rank: TaxonRank, name: &str) -> Result<TaxonId, StoreError> {
    store.broker().with_write("taxon.register", |conn| {
        conn.execute(
            "INSERT INTO taxon(level, name) VALUES(?1, ?2)",
            params![rank.level(), name],
        )
        .map_err(|e| db::map_unique(e, EntityKind::Taxon, format!("{}:{}", rank.name(), name)))?;
        Ok(TaxonId(conn.last_insert_rowid()))
    })
}

pub fn find_taxon(store: &Store, rank: TaxonRank, name: &str) -> Result<Option<TaxonId>, StoreError> {
    store.broker().with_read(|conn| {
        let id = conn
            .query_row(
                "SELECT id FROM taxon WHERE level = ?1 AND name = ?2",
                params![rank.level(), name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    })
}

/// Returns `true` when a new link was created, `false` when it already existed.
pub fn classify_bgc_taxonomy(store: &Store, bgc: BgcId, taxon: TaxonId) -> Result<bool, StoreError> {
    store.broker().with_write("taxon.classify_bgc", |conn| {
        db::require_row(conn, "bgc", bgc.0, EntityKind::Bgc)?;
        db::require_row(conn, "taxon", taxon.0, EntityKind::Taxon)?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO bgc_taxonomy(bgc_id, taxon_id) VALUES(?1, ?2)",
            params![bgc, taxon],
        )?;
        Ok(inserted > 0)
    })
}

/// Taxa assigned to `bgc`, broadest rank first.
pub fn taxonomy_of(store: &Store, bgc: BgcId) -> Result<Vec<Taxon>, StoreError> {
    store.broker().with_read(|conn| {
        db::require_row(conn, "bgc", bgc.0, EntityKind::Bgc)?;
        let mut stmt = conn.prepare(
            "SELECT t.id, t.level, t.name FROM bgc_taxonomy bt
             JOIN taxon t ON t.id = bt.taxon_id
             WHERE bt.bgc_id = ?1 ORDER BY t.level, t.id",
        )?;
        let rows = stmt.query_map([bgc], |row| {
            let level: i64 = row.get(1)?;
            Ok(Taxon {
                id: row.get(0)?,
                rank: TaxonRank::from_level(level)
                    .ok_or(rusqlite::Error::IntegralValueOutOfRange(1, level))?,
                name: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

/// Map an upstream classifier label (plus the BGC type it came from) onto a
/// canonical subclass. Repeating an identical mapping is a no-op; pointing an
/// existing label at a different subclass is rejected.
pub fn map_external_class(
    store: &Store,
    class_source: &str,
    type_source: &str,
    subclass: SubclassId,
) -> Result<(), StoreError> {
    store.broker().with_write("chem.map_external_class", |conn| {
        db::require_row(conn, "chem_subclass", subclass.0, EntityKind::ChemSubclass)?;
        let existing: Option<SubclassId> = conn
            .query_row(
                "SELECT subclass_id FROM chem_subclass_map
                 WHERE class_source = ?1 AND type_source = ?2",
                params![class_source, type_source],
                |row| row.get(0),
            )
            .optional()?;
        match existing {
            Some(id) if id == subclass => Ok(()),
            Some(id) => Err(StoreError::duplicate(
                EntityKind::ChemSubclassMapping,
                format!(
                    "{}/{} already mapped to subclass {}",
                    class_source, type_source, id
                ),
            )),
            None => {
                conn.execute(
                    "INSERT INTO chem_subclass_map(class_source, type_source, subclass_id)
                     VALUES(?1, ?2, ?3)",
                    params![class_source, type_source, subclass],
                )?;
                Ok(())
            }
        }
    })
}

pub fn resolve_subclass(
    store: &Store,
    class_source: &str,
    type_source: &str,
) -> Result<SubclassId, StoreError> {
    store.broker().with_read(|conn| {
        conn.query_row(
            "SELECT subclass_id FROM chem_subclass_map WHERE class_source = ?1 AND type_source = ?2",
            params![class_source, type_source],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| StoreError::Unmapped {
            class_source: class_source.to_string(),
            type_source: type_source.to_string(),
        })
    })
}

/// Returns `true` when a new link was created, `false` when it already existed.
pub fn classify_bgc_chemistry(
    store: &Store,
    bgc: BgcId,
    subclass: SubclassId,
) -> Result<bool, StoreError> {
    store.broker().with_write("chem.classify_bgc", |conn| {
        db::require_row(conn, "bgc", bgc.0, EntityKind::Bgc)?;
        db::require_row(conn, "chem_subclass", subclass.0, EntityKind::ChemSubclass)?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO bgc_class(bgc_id, chem_subclass_id) VALUES(?1, ?2)",
            params![bgc, subclass],
        )?;
        Ok(inserted > 0)
    })
}

pub fn chemistry_of(store: &Store, bgc: BgcId) -> Result<Vec<ChemSubclass>, StoreError> {
    store.broker().with_read(|conn| {
        db::require_row(conn, "bgc", bgc.0, EntityKind::Bgc)?;
        let mut stmt = conn.prepare(
            "SELECT cs.id, cs.class_id, cs.name FROM bgc_class bc
             JOIN chem_subclass cs ON cs.id = bc.chem_subclass_id
             WHERE bc.bgc_id = ?1 ORDER BY cs.id",
        )?;
        let rows = stmt.query_map([bgc], reference::row_to_subclass)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}
