//! Reference catalogs: closed enumerations every other table points at.
//!
//! Each catalog is a Rust enum with a stable integer id. The same rows are
//! seeded into SQLite (insert-if-absent) so foreign keys resolve and so other
//! tools reading the database see the labels.

use crate::core::error::{EntityKind, StoreError};
use crate::core::ids::SubclassId;
use crate::core::store::Store;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BgcType {
    As4,
    As5,
    Mibig,
}

impl BgcType {
    pub const ALL: [BgcType; 3] = [BgcType::As4, BgcType::As5, BgcType::Mibig];

    pub fn id(&self) -> i64 {
        match self {
            BgcType::As4 => 1,
            BgcType::As5 => 2,
            BgcType::Mibig => 3,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            BgcType::As4 => "as4",
            BgcType::As5 => "as5",
            BgcType::Mibig => "mibig",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BgcType::As4 => "antiSMASH4 clusterXXX.gbk",
            BgcType::As5 => "antiSMASH5 regionXXX.gbk",
            BgcType::Mibig => "MIBiG reference BGC",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HmmModelType {
    BigscapePfam,
    CombinedPfam,
    BigslicePfam,
    BigsliceSubpfam,
}

impl HmmModelType {
    pub const ALL: [HmmModelType; 4] = [
        HmmModelType::BigscapePfam,
        HmmModelType::CombinedPfam,
        HmmModelType::BigslicePfam,
        HmmModelType::BigsliceSubpfam,
    ];

    pub fn id(&self) -> i64 {
        match self {
            HmmModelType::BigscapePfam => 1,
            HmmModelType::CombinedPfam => 2,
            HmmModelType::BigslicePfam => 3,
            HmmModelType::BigsliceSubpfam => 4,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            HmmModelType::BigscapePfam => "bigscape_pfam",
            HmmModelType::CombinedPfam => "combined_pfam",
            HmmModelType::BigslicePfam => "bigslice_pfam",
            HmmModelType::BigsliceSubpfam => "bigslice_subpfam",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            HmmModelType::BigscapePfam => "Pfam-A models used by BiG-SCAPE",
            HmmModelType::CombinedPfam => "Pfam-A combined with BiG-SLiCE biosynthetic models",
            HmmModelType::BigslicePfam => "BiG-SLiCE biosynthetic Pfam models",
            HmmModelType::BigsliceSubpfam => "BiG-SLiCE sub-Pfam models",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }
}

/// BGC lifecycle. The only legal move is to [`BgcStatus::successor`].
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BgcStatus {
    Loaded,
    FullHmmScanned,
    SubpfamScanned,
    FeaturesExtracted,
}

impl BgcStatus {
    pub const ALL: [BgcStatus; 4] = [
        BgcStatus::Loaded,
        BgcStatus::FullHmmScanned,
        BgcStatus::SubpfamScanned,
        BgcStatus::FeaturesExtracted,
    ];

    pub fn id(&self) -> i64 {
        match self {
            BgcStatus::Loaded => 1,
            BgcStatus::FullHmmScanned => 2,
            BgcStatus::SubpfamScanned => 3,
            BgcStatus::FeaturesExtracted => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BgcStatus::Loaded => "LOADED",
            BgcStatus::FullHmmScanned => "FULL_HMM_SCANNED",
            BgcStatus::SubpfamScanned => "SUBPFAM_SCANNED",
            BgcStatus::FeaturesExtracted => "FEATURES_EXTRACTED",
        }
    }

    pub fn successor(&self) -> Option<Self> {
        match self {
            BgcStatus::Loaded => Some(BgcStatus::FullHmmScanned),
            BgcStatus::FullHmmScanned => Some(BgcStatus::SubpfamScanned),
            BgcStatus::SubpfamScanned => Some(BgcStatus::FeaturesExtracted),
            BgcStatus::FeaturesExtracted => None,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }
}

impl fmt::Display for BgcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    RunStarted,
    BiosynScanned,
    SubpfamScanned,
    FeaturesExtracted,
    ClusteringFinished,
    MembershipsAssigned,
    RunFinished,
}

impl RunStatus {
    pub const ALL: [RunStatus; 7] = [
        RunStatus::RunStarted,
        RunStatus::BiosynScanned,
        RunStatus::SubpfamScanned,
        RunStatus::FeaturesExtracted,
        RunStatus::ClusteringFinished,
        RunStatus::MembershipsAssigned,
        RunStatus::RunFinished,
    ];

    pub fn id(&self) -> i64 {
        Self::ALL
            .iter()
            .position(|s| s == self)
            .map(|p| p as i64 + 1)
            .unwrap_or_default()
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunStatus::RunStarted => "RUN_STARTED",
            RunStatus::BiosynScanned => "BIOSYN_SCANNED",
            RunStatus::SubpfamScanned => "SUBPFAM_SCANNED",
            RunStatus::FeaturesExtracted => "FEATURES_EXTRACTED",
            RunStatus::ClusteringFinished => "CLUSTERING_FINISHED",
            RunStatus::MembershipsAssigned => "MEMBERSHIPS_ASSIGNED",
            RunStatus::RunFinished => "RUN_FINISHED",
        }
    }

    pub fn successor(&self) -> Option<Self> {
        Self::from_id(self.id() + 1)
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Taxonomic rank ladder, broadest first. `level()` is the stored ordinal.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaxonRank {
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    Organism,
}

impl TaxonRank {
    pub const ALL: [TaxonRank; 8] = [
        TaxonRank::Kingdom,
        TaxonRank::Phylum,
        TaxonRank::Class,
        TaxonRank::Order,
        TaxonRank::Family,
        TaxonRank::Genus,
        TaxonRank::Species,
        TaxonRank::Organism,
    ];

    pub fn level(&self) -> i64 {
        *self as i64
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaxonRank::Kingdom => "Kingdom",
            TaxonRank::Phylum => "Phylum",
            TaxonRank::Class => "Class",
            TaxonRank::Order => "Order",
            TaxonRank::Family => "Family",
            TaxonRank::Genus => "Genus",
            TaxonRank::Species => "Species",
            TaxonRank::Organism => "Organism",
        }
    }

    pub fn from_level(level: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.level() == level)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChemClass {
    Unknown,
    Other,
    Alkaloid,
    #[serde(rename = "NRP")]
    Nrp,
    Polyketide,
    #[serde(rename = "RiPP")]
    Ripp,
    Saccharide,
    Terpene,
}

impl ChemClass {
    pub const ALL: [ChemClass; 8] = [
        ChemClass::Unknown,
        ChemClass::Other,
        ChemClass::Alkaloid,
        ChemClass::Nrp,
        ChemClass::Polyketide,
        ChemClass::Ripp,
        ChemClass::Saccharide,
        ChemClass::Terpene,
    ];

    pub fn id(&self) -> i64 {
        *self as i64 + 1
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChemClass::Unknown => "Unknown",
            ChemClass::Other => "Other",
            ChemClass::Alkaloid => "Alkaloid",
            ChemClass::Nrp => "NRP",
            ChemClass::Polyketide => "Polyketide",
            ChemClass::Ripp => "RiPP",
            ChemClass::Saccharide => "Saccharide",
            ChemClass::Terpene => "Terpene",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }
}

/// Seeded chemical subclasses. Ids are fixed so seeding is reproducible.
pub const CHEM_SUBCLASSES: &[(i64, ChemClass, &str)] = &[
    (1, ChemClass::Unknown, "Unknown"),
    (2, ChemClass::Other, "Other"),
    (3, ChemClass::Alkaloid, "Other"),
    (4, ChemClass::Nrp, "Other"),
    (5, ChemClass::Nrp, "Glycopeptide"),
    (6, ChemClass::Nrp, "Lipopeptide"),
    (7, ChemClass::Polyketide, "Other"),
    (8, ChemClass::Polyketide, "Type I"),
    (9, ChemClass::Polyketide, "Type II"),
    (10, ChemClass::Polyketide, "Type III"),
    (11, ChemClass::Polyketide, "Trans-AT"),
    (12, ChemClass::Polyketide, "Enediyne"),
    (13, ChemClass::Ripp, "Other"),
    (14, ChemClass::Ripp, "Lanthipeptide"),
    (15, ChemClass::Ripp, "Lassopeptide"),
    (16, ChemClass::Ripp, "Thiopeptide"),
    (17, ChemClass::Ripp, "Sactipeptide"),
    (18, ChemClass::Ripp, "Bacteriocin"),
    (19, ChemClass::Saccharide, "Other"),
    (20, ChemClass::Saccharide, "Aminoglycoside"),
    (21, ChemClass::Terpene, "Other"),
];

/// The closed catalogs, addressable by their textual code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceCatalog {
    BgcType,
    HmmModelType,
    RunStatus,
    BgcStatus,
    TaxonClass,
    ChemClass,
}

impl ReferenceCatalog {
    fn table(&self) -> &'static str {
        match self {
            ReferenceCatalog::BgcType => "bgc_type",
            ReferenceCatalog::HmmModelType => "hmm_model_type",
            ReferenceCatalog::RunStatus => "run_status",
            ReferenceCatalog::BgcStatus => "bgc_status",
            ReferenceCatalog::TaxonClass => "taxon_class",
            ReferenceCatalog::ChemClass => "chem_class",
        }
    }

    fn key_column(&self) -> &'static str {
        match self {
            ReferenceCatalog::BgcType | ReferenceCatalog::HmmModelType => "code",
            _ => "name",
        }
    }

    fn id_column(&self) -> &'static str {
        match self {
            ReferenceCatalog::TaxonClass => "level",
            _ => "id",
        }
    }
}

/// Insert every catalog row that is not already present.
pub fn seed_catalogs(conn: &Connection) -> Result<(), rusqlite::Error> {
    for t in BgcType::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO bgc_type(id, code, description) VALUES(?1, ?2, ?3)",
            params![t.id(), t.code(), t.description()],
        )?;
    }
    for t in HmmModelType::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO hmm_model_type(id, code, description) VALUES(?1, ?2, ?3)",
            params![t.id(), t.code(), t.description()],
        )?;
    }
    for s in RunStatus::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO run_status(id, name) VALUES(?1, ?2)",
            params![s.id(), s.name()],
        )?;
    }
    for s in BgcStatus::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO bgc_status(id, name) VALUES(?1, ?2)",
            params![s.id(), s.name()],
        )?;
    }
    for r in TaxonRank::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO taxon_class(id, level, name) VALUES(?1, ?2, ?3)",
            params![r.level() + 1, r.level(), r.name()],
        )?;
    }
    for c in ChemClass::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO chem_class(id, name) VALUES(?1, ?2)",
            params![c.id(), c.name()],
        )?;
    }
    for (id, class, name) in CHEM_SUBCLASSES {
        conn.execute(
            "INSERT OR IGNORE INTO chem_subclass(id, class_id, name) VALUES(?1, ?2, ?3)",
            params![id, class.id(), name],
        )?;
    }
    Ok(())
}

/// Re-run catalog seeding. Rows already present are left untouched.
pub fn seed(store: &Store) -> Result<(), StoreError> {
    store.broker().with_write("reference.seed", |conn| {
        seed_catalogs(conn)?;
        Ok(())
    })
}

/// Look up the stable id of a catalog entry by its code or name.
pub fn resolve(store: &Store, catalog: ReferenceCatalog, code: &str) -> Result<i64, StoreError> {
    store.broker().with_read(|conn| {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            catalog.id_column(),
            catalog.table(),
            catalog.key_column()
        );
        conn.query_row(&sql, [code], |row| row.get(0))
            .optional()?
            .ok_or_else(|| {
                StoreError::not_found(
                    EntityKind::ReferenceEntry,
                    format!("{}:{}", catalog.table(), code),
                )
            })
    })
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChemSubclass {
    pub id: SubclassId,
    pub class: ChemClass,
    pub name: String,
}

pub(crate) fn row_to_subclass(row: &rusqlite::Row) -> Result<ChemSubclass, rusqlite::Error> {
    let class_id: i64 = row.get(1)?;
    Ok(ChemSubclass {
        id: row.get(0)?,
        class: ChemClass::from_id(class_id)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(1, class_id))?,
        name: row.get(2)?,
    })
}

pub fn subclass_id(store: &Store, class: ChemClass, name: &str) -> Result<SubclassId, StoreError> {
    store.broker().with_read(|conn| {
        conn.query_row(
            "SELECT id FROM chem_subclass WHERE class_id = ?1 AND name = ?2",
            params![class.id(), name],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| {
            StoreError::not_found(EntityKind::ChemSubclass, format!("{}/{}", class.name(), name))
        })
    })
}

pub fn list_subclasses(store: &Store, class: ChemClass) -> Result<Vec<ChemSubclass>, StoreError> {
    store.broker().with_read(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, class_id, name FROM chem_subclass WHERE class_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([class.id()], row_to_subclass)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}
