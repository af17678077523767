//! bgcstore: the integrity-checked catalog behind a BGC genome-mining pipeline.
//!
//! The store keeps datasets of biosynthetic gene clusters (BGCs), their coding
//! sequences, HMM domain hits and alignments, taxonomy and chemical class
//! assignments, and the per-BGC feature vectors consumed by clustering.
//! Pipeline stages (parsers, HMM search, MSA, feature extraction) live
//! elsewhere and talk to the store only through the operations in [`catalog`].
//!
//! # Architecture
//!
//! ## One database, many families
//!
//! A store is a directory holding one SQLite database (`bgcstore.db`), an
//! optional `bgcstore.toml` and the audit trail `store.events.jsonl`.
//! Opening it creates the schema, checks the persisted schema version and
//! seeds the closed reference catalogs.
//!
//! ## The Thin Waist
//!
//! Every operation goes through [`core::broker::DbBroker`]:
//! - Writes: per-database mutex plus one `BEGIN IMMEDIATE` transaction, so
//!   uniqueness checks and status transitions are atomic across threads and
//!   processes, and a failed operation leaves nothing behind
//! - Reads: fresh WAL connections, never blocked by the write mutex
//! - Audit: one JSON line per write operation
//!
//! ## Invariants
//!
//! - Foreign keys always resolve; a missing referent surfaces as `NotFound`
//! - Duplicate natural keys fail with `DuplicateKey`, never overwrite
//! - BGC status only moves to its immediate successor:
//!   `LOADED -> FULL_HMM_SCANNED -> SUBPFAM_SCANNED -> FEATURES_EXTRACTED`
//! - Sub-profile hierarchies (HMMs and HSPs) never cycle
//!
//! # Crate Structure
//!
//! - [`core`]: store handle, broker, pool, schema, config and errors
//! - [`catalog`]: datasets/BGCs, HMMs, sequence features, classification,
//!   features and runs

pub mod catalog;
pub mod core;

pub use crate::core::error::{EntityKind, StoreError};
pub use crate::core::ids::{
    BgcId, CdsId, DatasetId, HmmId, HspId, MsaId, RunId, SubclassId, TaxonId,
};
pub use crate::core::store::Store;
