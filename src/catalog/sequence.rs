//! Sequence feature store: CDS records, domain hits, alignments and MSA segments.
//!
//! Domain hits come in two independent families (the primary HMM scan and the
//! BiG-SLiCE rescan). Both families share one implementation; [`HspFamily`]
//! only selects which set of tables a call touches. Rows from one family are
//! never visible through the other.

use crate::core::db;
use crate::core::error::{EntityKind, StoreError};
use crate::core::ids::{BgcId, CdsId, HmmId, HspId, MsaId};
use crate::core::store::Store;
use rusqlite::{Connection, OptionalExtension, params};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HspFamily {
    Primary,
    Bigslice,
}

impl HspFamily {
    pub const ALL: [HspFamily; 2] = [HspFamily::Primary, HspFamily::Bigslice];

    /// Hit table; `<table>_alignment` and `<table>_subpfam` hang off it.
    pub fn table(&self) -> &'static str {
        match self {
            HspFamily::Primary => "hsp",
            HspFamily::Bigslice => "hsp_bigslice",
        }
    }

    fn op(&self, action: &str) -> String {
        format!("{}.{}", self.table(), action)
    }
}

impl fmt::Display for HspFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HspFamily::Primary => f.write_str("primary"),
            HspFamily::Bigslice => f.write_str("bigslice"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Cds {
    pub id: CdsId,
    pub bgc_id: BgcId,
    pub orf_id: i64,
    pub nt_start: i64,
    pub nt_end: i64,
    pub strand: i8,
    pub locus_tag: Option<String>,
    pub protein_id: Option<String>,
    pub product: Option<String>,
    pub biosynthetic: bool,
    pub aa_seq: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CdsInput {
    pub orf_id: i64,
    pub nt_start: i64,
    pub nt_end: i64,
    pub strand: i8,
    pub locus_tag: Option<String>,
    pub protein_id: Option<String>,
    pub product: Option<String>,
    pub biosynthetic: bool,
    pub aa_seq: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Hsp {
    pub id: HspId,
    pub family: HspFamily,
    pub serial_nr: i64,
    pub cds_id: CdsId,
    pub hmm_id: HmmId,
    pub bitscore: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HspInput {
    pub serial_nr: i64,
    pub cds_id: CdsId,
    pub hmm_id: HmmId,
    pub bitscore: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HspAlignment {
    pub env_start: i64,
    pub env_end: i64,
    pub model_start: i64,
    pub model_end: i64,
    pub model_gaps: String,
    pub cds_start: i64,
    pub cds_end: i64,
    pub cds_gaps: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MsaSegment {
    pub id: MsaId,
    pub cds_id: CdsId,
    pub hmm_id: HmmId,
    pub env_start: i64,
    pub env_end: i64,
    pub alignment: String,
}

fn check_range(field: &'static str, start: i64, end: i64) -> Result<(), StoreError> {
    if end < start {
        return Err(StoreError::InvalidRange { field, start, end });
    }
    Ok(())
}

fn row_to_cds(row: &rusqlite::Row) -> Result<Cds, rusqlite::Error> {
    Ok(Cds {
        id: row.get(0)?,
        bgc_id: row.get(1)?,
        orf_id: row.get(2)?,
        nt_start: row.get(3)?,
        nt_end: row.get(4)?,
        strand: row.get(5)?,
        locus_tag: row.get(6)?,
        protein_id: row.get(7)?,
        product: row.get(8)?,
        biosynthetic: row.get(9)?,
        aa_seq: row.get(10)?,
    })
}

const CDS_COLUMNS: &str = "id, bgc_id, orf_id, nt_start, nt_end, strand, locus_tag, \
                           protein_id, product, biosynthetic, aa_seq";

pub fn register_cds(store: &Store, bgc: BgcId, input: &CdsInput) -> Result<CdsId, StoreError> {
    if !(-1..=1).contains(&input.strand) {
        return Err(StoreError::InvalidStrand(i64::from(input.strand)));
    }
    if input.aa_seq.is_empty() {
        return Err(StoreError::EmptySequence);
    }
    check_range("nt", input.nt_start, input.nt_end)?;

    store.broker().with_write("cds.register", |conn| {
        db::require_row(conn, "bgc", bgc.0, EntityKind::Bgc)?;
        conn.execute(
            "INSERT INTO cds(bgc_id, orf_id, nt_start, nt_end, strand, locus_tag, protein_id,
                             product, biosynthetic, aa_seq)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                bgc,
                input.orf_id,
                input.nt_start,
                input.nt_end,
                input.strand,
                input.locus_tag,
                input.protein_id,
                input.product,
                input.biosynthetic,
                input.aa_seq
            ],
        )
        .map_err(|e| {
            db::map_unique(e, EntityKind::Cds, format!("bgc {} orf {}", bgc, input.orf_id))
        })?;
        Ok(CdsId(conn.last_insert_rowid()))
    })
}

pub fn get_cds(store: &Store, id: CdsId) -> Result<Cds, StoreError> {
    store.broker().with_read(|conn| {
        let sql = format!("SELECT {} FROM cds WHERE id = ?1", CDS_COLUMNS);
        conn.query_row(&sql, [id], row_to_cds)
            .optional()?
            .ok_or_else(|| StoreError::not_found(EntityKind::Cds, id))
    })
}

/// CDS records of a BGC ordered by ORF id.
pub fn cds_for_bgc(store: &Store, bgc: BgcId) -> Result<Vec<Cds>, StoreError> {
    store.broker().with_read(|conn| {
        db::require_row(conn, "bgc", bgc.0, EntityKind::Bgc)?;
        let sql = format!(
            "SELECT {} FROM cds WHERE bgc_id = ?1 ORDER BY orf_id",
            CDS_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([bgc], row_to_cds)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

fn insert_hsp(conn: &Connection, family: HspFamily, input: &HspInput) -> Result<HspId, StoreError> {
    if !input.bitscore.is_finite() {
        return Err(StoreError::ValidationError(format!(
            "{} hit serial {} on cds {} has non-finite bitscore {}",
            family, input.serial_nr, input.cds_id, input.bitscore
        )));
    }
    db::require_row(conn, "cds", input.cds_id.0, EntityKind::Cds)?;
    db::require_row(conn, "hmm", input.hmm_id.0, EntityKind::Hmm)?;
    let sql = format!(
        "INSERT INTO {}(serial_nr, cds_id, hmm_id, bitscore) VALUES(?1, ?2, ?3, ?4)",
        family.table()
    );
    conn.execute(
        &sql,
        params![input.serial_nr, input.cds_id, input.hmm_id, input.bitscore],
    )
    .map_err(|e| {
        db::map_unique(
            e,
            EntityKind::Hsp,
            format!(
                "{} serial {} cds {} hmm {}",
                family, input.serial_nr, input.cds_id, input.hmm_id
            ),
        )
    })?;
    Ok(HspId(conn.last_insert_rowid()))
}

pub fn record_hsp(store: &Store, family: HspFamily, input: &HspInput) -> Result<HspId, StoreError> {
    store
        .broker()
        .with_write(&family.op("record"), |conn| insert_hsp(conn, family, input))
}

/// Record a whole scan batch in one transaction. Any failing row aborts the
/// batch and nothing from it is stored.
pub fn record_hsps(
    store: &Store,
    family: HspFamily,
    inputs: &[HspInput],
) -> Result<Vec<HspId>, StoreError> {
    store.broker().with_write(&family.op("record_batch"), |conn| {
        let mut ids = Vec::with_capacity(inputs.len());
        for input in inputs {
            ids.push(insert_hsp(conn, family, input)?);
        }
        Ok(ids)
    })
}

pub fn record_alignment(
    store: &Store,
    family: HspFamily,
    hsp: HspId,
    alignment: &HspAlignment,
) -> Result<(), StoreError> {
    check_range("envelope", alignment.env_start, alignment.env_end)?;
    check_range("model", alignment.model_start, alignment.model_end)?;
    check_range("cds", alignment.cds_start, alignment.cds_end)?;

    store.broker().with_write(&family.op("record_alignment"), |conn| {
        db::require_row(conn, family.table(), hsp.0, EntityKind::Hsp)?;
        let sql = format!(
            "INSERT INTO {}_alignment(hsp_id, env_start, env_end, model_start, model_end,
                                      model_gaps, cds_start, cds_end, cds_gaps)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            family.table()
        );
        conn.execute(
            &sql,
            params![
                hsp,
                alignment.env_start,
                alignment.env_end,
                alignment.model_start,
                alignment.model_end,
                alignment.model_gaps,
                alignment.cds_start,
                alignment.cds_end,
                alignment.cds_gaps
            ],
        )
        .map_err(|e| {
            db::map_unique(e, EntityKind::HspAlignment, format!("{} hsp {}", family, hsp))
        })?;
        Ok(())
    })
}

pub fn get_alignment(
    store: &Store,
    family: HspFamily,
    hsp: HspId,
) -> Result<Option<HspAlignment>, StoreError> {
    store.broker().with_read(|conn| {
        let sql = format!(
            "SELECT env_start, env_end, model_start, model_end, model_gaps, cds_start, cds_end,
                    cds_gaps
             FROM {}_alignment WHERE hsp_id = ?1",
            family.table()
        );
        let alignment = conn
            .query_row(&sql, [hsp], |row| {
                Ok(HspAlignment {
                    env_start: row.get(0)?,
                    env_end: row.get(1)?,
                    model_start: row.get(2)?,
                    model_end: row.get(3)?,
                    model_gaps: row.get(4)?,
                    cds_start: row.get(5)?,
                    cds_end: row.get(6)?,
                    cds_gaps: row.get(7)?,
                })
            })
            .optional()?;
        Ok(alignment)
    })
}

/// True when `to` is reachable from `from` by following parent links.
fn reaches(
    conn: &Connection,
    family: HspFamily,
    from: HspId,
    to: HspId,
) -> Result<bool, StoreError> {
    let sql = format!(
        "SELECT parent_hsp_id FROM {}_subpfam WHERE hsp_id = ?1",
        family.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut visited = FxHashSet::default();
    let mut stack = vec![from];

    while let Some(current) = stack.pop() {
        if current == to {
            return Ok(true);
        }
        if !visited.insert(current) {
            continue;
        }
        let rows = stmt.query_map([current], |row| row.get::<_, HspId>(0))?;
        for row in rows {
            stack.push(row?);
        }
    }

    Ok(false)
}

/// Record that sub-profile hit `sub` refines `parent`. A hit may refine several
/// parents, but a pair is stored once and no hit may end up above itself.
pub fn link_subpfam_hsp(
    store: &Store,
    family: HspFamily,
    sub: HspId,
    parent: HspId,
) -> Result<(), StoreError> {
    store.broker().with_write(&family.op("link_subpfam"), |conn| {
        db::require_row(conn, family.table(), sub.0, EntityKind::Hsp)?;
        db::require_row(conn, family.table(), parent.0, EntityKind::Hsp)?;
        if sub == parent {
            return Err(StoreError::SelfReference {
                kind: EntityKind::Hsp,
                id: sub.0,
            });
        }
        if reaches(conn, family, parent, sub)? {
            return Err(StoreError::CycleDetected {
                kind: EntityKind::Hsp,
                child: sub.0,
                parent: parent.0,
            });
        }
        let sql = format!(
            "INSERT INTO {}_subpfam(hsp_id, parent_hsp_id) VALUES(?1, ?2)",
            family.table()
        );
        conn.execute(&sql, params![sub, parent]).map_err(|e| {
            db::map_unique(
                e,
                EntityKind::HspSubProfileLink,
                format!("{} hsp {} -> {}", family, sub, parent),
            )
        })?;
        Ok(())
    })
}

/// Parent hits that `sub` refines, in id order.
pub fn hsp_parents(store: &Store, family: HspFamily, sub: HspId) -> Result<Vec<HspId>, StoreError> {
    store.broker().with_read(|conn| {
        db::require_row(conn, family.table(), sub.0, EntityKind::Hsp)?;
        let sql = format!(
            "SELECT parent_hsp_id FROM {}_subpfam WHERE hsp_id = ?1 ORDER BY parent_hsp_id",
            family.table()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([sub], |row| row.get(0))?;
        let mut out: Vec<HspId> = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

pub fn record_msa_segment(
    store: &Store,
    cds: CdsId,
    hmm: HmmId,
    env_start: i64,
    env_end: i64,
    alignment: &str,
) -> Result<MsaId, StoreError> {
    check_range("envelope", env_start, env_end)?;
    store.broker().with_write("msa.record", |conn| {
        db::require_row(conn, "cds", cds.0, EntityKind::Cds)?;
        db::require_row(conn, "hmm", hmm.0, EntityKind::Hmm)?;
        conn.execute(
            "INSERT INTO msa(cds_id, hmm_id, env_start, env_end, alignment)
             VALUES(?1, ?2, ?3, ?4, ?5)",
            params![cds, hmm, env_start, env_end, alignment],
        )
        .map_err(|e| {
            db::map_unique(
                e,
                EntityKind::MsaSegment,
                format!("cds {} hmm {} env {}-{}", cds, hmm, env_start, env_end),
            )
        })?;
        Ok(MsaId(conn.last_insert_rowid()))
    })
}

pub fn msa_segments_for_cds(store: &Store, cds: CdsId) -> Result<Vec<MsaSegment>, StoreError> {
    store.broker().with_read(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, cds_id, hmm_id, env_start, env_end, alignment
             FROM msa WHERE cds_id = ?1 ORDER BY hmm_id, env_start, env_end",
        )?;
        let rows = stmt.query_map([cds], |row| {
            Ok(MsaSegment {
                id: row.get(0)?,
                cds_id: row.get(1)?,
                hmm_id: row.get(2)?,
                env_start: row.get(3)?,
                env_end: row.get(4)?,
                alignment: row.get(5)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

fn query_hsps<P: rusqlite::Params>(
    conn: &Connection,
    family: HspFamily,
    filter: &str,
    params: P,
) -> Result<Vec<Hsp>, StoreError> {
    let sql = format!(
        "SELECT id, serial_nr, cds_id, hmm_id, bitscore FROM {} WHERE {}
         ORDER BY bitscore DESC, id",
        family.table(),
        filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok(Hsp {
            id: row.get(0)?,
            family,
            serial_nr: row.get(1)?,
            cds_id: row.get(2)?,
            hmm_id: row.get(3)?,
            bitscore: row.get(4)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Hits on `cds`, strongest first.
pub fn hsps_for_cds(store: &Store, family: HspFamily, cds: CdsId) -> Result<Vec<Hsp>, StoreError> {
    store.broker().with_read(|conn| {
        db::require_row(conn, "cds", cds.0, EntityKind::Cds)?;
        query_hsps(conn, family, "cds_id = ?1", [cds])
    })
}

/// Hits scoring at least `threshold`, strongest first.
pub fn hsps_above_score(
    store: &Store,
    family: HspFamily,
    threshold: f64,
) -> Result<Vec<Hsp>, StoreError> {
    store
        .broker()
        .with_read(|conn| query_hsps(conn, family, "bitscore >= ?1", [threshold]))
}
