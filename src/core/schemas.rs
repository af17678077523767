//! Centralized database schema definitions.
//!
//! One SQLite database holds the whole catalog. Tables fall into the same
//! groups as the catalog modules:
//! 1. Reference catalogs: closed enumerations seeded at open.
//! 2. Datasets and BGCs.
//! 3. HMM profiles and the sub-profile relation.
//! 4. CDS, the two HSP families, alignments, HSP links and MSA segments.
//! 5. Taxonomy and chemical classification.
//! 6. Feature matrix and run ledger.

pub const SCHEMA_VERSION: &str = "1.0.1";

pub const SCHEMA_VERSION_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        version TEXT NOT NULL
    );
";

// --- 1. Reference catalogs ---
pub const REFERENCE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS bgc_type (
        id INTEGER PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS hmm_model_type (
        id INTEGER PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS run_status (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );
    CREATE TABLE IF NOT EXISTS bgc_status (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );
    CREATE TABLE IF NOT EXISTS taxon_class (
        id INTEGER PRIMARY KEY,
        level INTEGER NOT NULL UNIQUE,
        name TEXT NOT NULL UNIQUE
    );
    CREATE TABLE IF NOT EXISTS chem_class (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    );
    CREATE TABLE IF NOT EXISTS chem_subclass (
        id INTEGER PRIMARY KEY,
        class_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        UNIQUE(class_id, name),
        FOREIGN KEY(class_id) REFERENCES chem_class(id)
    );
";

// --- 2. Datasets and BGCs ---
pub const DATASET_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS dataset (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        orig_folder TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE IF NOT EXISTS bgc (
        id INTEGER PRIMARY KEY,
        dataset_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        type_id INTEGER NOT NULL,
        on_contig_edge INTEGER NOT NULL,
        length_nt INTEGER NOT NULL,
        orig_folder TEXT NOT NULL,
        orig_filename TEXT NOT NULL,
        organism TEXT,
        product TEXT,
        status_id INTEGER NOT NULL DEFAULT 1,
        UNIQUE(dataset_id, orig_folder, orig_filename),
        FOREIGN KEY(dataset_id) REFERENCES dataset(id),
        FOREIGN KEY(type_id) REFERENCES bgc_type(id),
        FOREIGN KEY(status_id) REFERENCES bgc_status(id)
    );
    CREATE INDEX IF NOT EXISTS idx_bgc_dataset ON bgc(dataset_id);
";

// --- 3. HMM profiles ---
pub const HMM_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS hmm (
        id INTEGER PRIMARY KEY,
        accession TEXT NOT NULL DEFAULT '',
        name TEXT NOT NULL,
        model_length INTEGER NOT NULL,
        model_type_id INTEGER NOT NULL,
        UNIQUE(accession, name, model_length),
        FOREIGN KEY(model_type_id) REFERENCES hmm_model_type(id)
    );
    CREATE TABLE IF NOT EXISTS subpfam (
        hmm_id INTEGER PRIMARY KEY,
        parent_hmm_id INTEGER NOT NULL,
        FOREIGN KEY(hmm_id) REFERENCES hmm(id),
        FOREIGN KEY(parent_hmm_id) REFERENCES hmm(id)
    );
    CREATE INDEX IF NOT EXISTS idx_subpfam_parent ON subpfam(parent_hmm_id);
";

// --- 4. Sequence features ---
pub const CDS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS cds (
        id INTEGER PRIMARY KEY,
        bgc_id INTEGER NOT NULL,
        orf_id INTEGER NOT NULL,
        nt_start INTEGER NOT NULL,
        nt_end INTEGER NOT NULL,
        strand INTEGER NOT NULL CHECK (strand IN (-1, 0, 1)),
        locus_tag TEXT,
        protein_id TEXT,
        product TEXT,
        biosynthetic INTEGER NOT NULL,
        aa_seq TEXT NOT NULL CHECK (length(aa_seq) > 0),
        UNIQUE(bgc_id, orf_id),
        FOREIGN KEY(bgc_id) REFERENCES bgc(id)
    );
";

pub const MSA_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS msa (
        id INTEGER PRIMARY KEY,
        cds_id INTEGER NOT NULL,
        hmm_id INTEGER NOT NULL,
        env_start INTEGER NOT NULL,
        env_end INTEGER NOT NULL,
        alignment TEXT NOT NULL,
        CHECK (env_start <= env_end),
        UNIQUE(cds_id, hmm_id, env_start, env_end),
        FOREIGN KEY(cds_id) REFERENCES cds(id),
        FOREIGN KEY(hmm_id) REFERENCES hmm(id)
    );
";

/// DDL for one hit family. Both families share the exact same shape and
/// constraints; only the table prefix differs.
pub fn hsp_family_schema(prefix: &str) -> String {
    format!(
        "
    CREATE TABLE IF NOT EXISTS {p} (
        id INTEGER PRIMARY KEY,
        serial_nr INTEGER NOT NULL,
        cds_id INTEGER NOT NULL,
        hmm_id INTEGER NOT NULL,
        bitscore REAL NOT NULL,
        UNIQUE(serial_nr, cds_id, hmm_id),
        FOREIGN KEY(cds_id) REFERENCES cds(id),
        FOREIGN KEY(hmm_id) REFERENCES hmm(id)
    );
    CREATE INDEX IF NOT EXISTS idx_{p}_cds ON {p}(cds_id);
    CREATE INDEX IF NOT EXISTS idx_{p}_bitscore ON {p}(bitscore);
    CREATE TABLE IF NOT EXISTS {p}_alignment (
        hsp_id INTEGER PRIMARY KEY,
        env_start INTEGER NOT NULL,
        env_end INTEGER NOT NULL,
        model_start INTEGER NOT NULL,
        model_end INTEGER NOT NULL,
        model_gaps TEXT NOT NULL,
        cds_start INTEGER NOT NULL,
        cds_end INTEGER NOT NULL,
        cds_gaps TEXT NOT NULL,
        FOREIGN KEY(hsp_id) REFERENCES {p}(id)
    );
    CREATE TABLE IF NOT EXISTS {p}_subpfam (
        hsp_id INTEGER NOT NULL,
        parent_hsp_id INTEGER NOT NULL,
        UNIQUE(hsp_id, parent_hsp_id),
        FOREIGN KEY(hsp_id) REFERENCES {p}(id),
        FOREIGN KEY(parent_hsp_id) REFERENCES {p}(id)
    );
    CREATE INDEX IF NOT EXISTS idx_{p}_subpfam_parent ON {p}_subpfam(parent_hsp_id);
",
        p = prefix
    )
}

// --- 5. Taxonomy and chemistry ---
pub const CLASSIFICATION_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS taxon (
        id INTEGER PRIMARY KEY,
        level INTEGER NOT NULL,
        name TEXT NOT NULL,
        UNIQUE(level, name),
        FOREIGN KEY(level) REFERENCES taxon_class(level)
    );
    CREATE TABLE IF NOT EXISTS bgc_taxonomy (
        bgc_id INTEGER NOT NULL,
        taxon_id INTEGER NOT NULL,
        UNIQUE(bgc_id, taxon_id),
        FOREIGN KEY(bgc_id) REFERENCES bgc(id),
        FOREIGN KEY(taxon_id) REFERENCES taxon(id)
    );
    CREATE TABLE IF NOT EXISTS chem_subclass_map (
        class_source TEXT NOT NULL,
        type_source TEXT NOT NULL,
        subclass_id INTEGER NOT NULL,
        UNIQUE(class_source, type_source),
        FOREIGN KEY(subclass_id) REFERENCES chem_subclass(id)
    );
    CREATE TABLE IF NOT EXISTS bgc_class (
        bgc_id INTEGER NOT NULL,
        chem_subclass_id INTEGER NOT NULL,
        UNIQUE(bgc_id, chem_subclass_id),
        FOREIGN KEY(bgc_id) REFERENCES bgc(id),
        FOREIGN KEY(chem_subclass_id) REFERENCES chem_subclass(id)
    );
";

// --- 6. Features and runs ---
pub const FEATURES_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS bgc_features (
        bgc_id INTEGER NOT NULL,
        hmm_id INTEGER NOT NULL,
        value INTEGER NOT NULL,
        PRIMARY KEY(bgc_id, hmm_id),
        FOREIGN KEY(bgc_id) REFERENCES bgc(id),
        FOREIGN KEY(hmm_id) REFERENCES hmm(id)
    );
";

pub const RUN_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS run (
        id INTEGER PRIMARY KEY,
        status_id INTEGER NOT NULL DEFAULT 1,
        params TEXT NOT NULL DEFAULT '{}',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY(status_id) REFERENCES run_status(id)
    );
";

/// Every catalog DDL batch in dependency order. The version table is not
/// included; it has to be checked before any of these run.
pub fn all_schemas(hsp_prefixes: &[&str]) -> Vec<String> {
    let mut out = vec![
        REFERENCE_SCHEMA.to_string(),
        DATASET_SCHEMA.to_string(),
        HMM_SCHEMA.to_string(),
        CDS_SCHEMA.to_string(),
        MSA_SCHEMA.to_string(),
    ];
    out.extend(hsp_prefixes.iter().map(|p| hsp_family_schema(p)));
    out.push(CLASSIFICATION_SCHEMA.to_string());
    out.push(FEATURES_SCHEMA.to_string());
    out.push(RUN_SCHEMA.to_string());
    out
}
