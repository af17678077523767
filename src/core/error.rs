use serde::Serialize;
use std::fmt;
use std::io;
use thiserror::Error;

/// Record family a lookup or uniqueness failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ReferenceEntry,
    Dataset,
    Bgc,
    Cds,
    Hmm,
    SubProfileLink,
    Hsp,
    HspAlignment,
    HspSubProfileLink,
    MsaSegment,
    Taxon,
    TaxonomyLink,
    ChemSubclass,
    ChemSubclassMapping,
    ChemistryLink,
    Feature,
    Run,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::ReferenceEntry => "reference entry",
            EntityKind::Dataset => "dataset",
            EntityKind::Bgc => "bgc",
            EntityKind::Cds => "cds",
            EntityKind::Hmm => "hmm",
            EntityKind::SubProfileLink => "sub-profile link",
            EntityKind::Hsp => "hsp",
            EntityKind::HspAlignment => "hsp alignment",
            EntityKind::HspSubProfileLink => "hsp sub-profile link",
            EntityKind::MsaSegment => "msa segment",
            EntityKind::Taxon => "taxon",
            EntityKind::TaxonomyLink => "taxonomy link",
            EntityKind::ChemSubclass => "chemical subclass",
            EntityKind::ChemSubclassMapping => "chemical subclass mapping",
            EntityKind::ChemistryLink => "chemistry link",
            EntityKind::Feature => "feature",
            EntityKind::Run => "run",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("{kind} not found: {key}")]
    NotFound { kind: EntityKind, key: String },
    #[error("duplicate {kind}: {key}")]
    DuplicateKey { kind: EntityKind, key: String },
    #[error("invalid status transition for {subject}: {from} -> {to}")]
    InvalidTransition {
        subject: String,
        from: String,
        to: String,
    },
    #[error("bgc {bgc} is {actual}, requires at least {required}")]
    StatusPrecondition {
        bgc: i64,
        required: String,
        actual: String,
    },
    #[error("invalid {field} range: end {end} < start {start}")]
    InvalidRange {
        field: &'static str,
        start: i64,
        end: i64,
    },
    #[error("invalid strand {0}: must be -1, 0 or 1")]
    InvalidStrand(i64),
    #[error("amino-acid sequence must not be empty")]
    EmptySequence,
    #[error("{kind} {id} cannot be linked to itself")]
    SelfReference { kind: EntityKind, id: i64 },
    #[error("linking {kind} {child} under {parent} would create a cycle")]
    CycleDetected {
        kind: EntityKind,
        child: i64,
        parent: i64,
    },
    #[error("no subclass mapping for class '{class_source}' and type '{type_source}'")]
    Unmapped {
        class_source: String,
        type_source: String,
    },
    #[error("schema version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },
}

impl StoreError {
    pub fn not_found(kind: EntityKind, key: impl fmt::Display) -> Self {
        StoreError::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn duplicate(kind: EntityKind, key: impl fmt::Display) -> Self {
        StoreError::DuplicateKey {
            kind,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self, kind: EntityKind) -> bool {
        matches!(self, StoreError::NotFound { kind: k, .. } if *k == kind)
    }

    pub fn is_duplicate(&self, kind: EntityKind) -> bool {
        matches!(self, StoreError::DuplicateKey { kind: k, .. } if *k == kind)
    }

    /// Only a schema version mismatch cannot be fixed by retrying with other input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::VersionMismatch { .. })
    }
}
