//! Store handle: one on-disk catalog rooted at a directory.
//!
//! The root holds the SQLite database, the optional `bgcstore.toml` and the
//! broker's audit trail. Opening a store creates the schema if needed, checks
//! the schema version and seeds the reference catalogs.

use crate::catalog::reference;
use crate::catalog::sequence::HspFamily;
use crate::core::broker::DbBroker;
use crate::core::config::StoreConfig;
use crate::core::error::StoreError;
use crate::core::schemas;
use crate::core::version;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute path to the store root directory
    pub root: PathBuf,
    pub config: StoreConfig,
}

impl Store {
    /// Open (or create) the store at `root`, reading `bgcstore.toml` if present.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        let config = StoreConfig::load(root)?;
        Self::open_with_config(root, config)
    }

    pub fn open_with_config(root: &Path, config: StoreConfig) -> Result<Self, StoreError> {
        fs::create_dir_all(root).map_err(StoreError::IoError)?;
        let store = Store {
            root: root.to_path_buf(),
            config,
        };
        initialize_store(&store, schemas::SCHEMA_VERSION)?;
        Ok(store)
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(&self.config.db_file)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.root.join(&self.config.audit_file)
    }

    pub fn broker(&self) -> DbBroker {
        let audit = self.config.audit_log.then(|| self.audit_log_path());
        DbBroker::new(
            self.db_path(),
            audit,
            &self.config.actor,
            self.config.pool_settings(),
        )
    }
}

/// Check the version marker, create tables and seed catalogs in one
/// transaction. Safe to run concurrently from several processes.
///
/// The version is checked before any catalog DDL so a store laid out by
/// another schema version fails with `VersionMismatch` and is left untouched.
pub fn initialize_store(store: &Store, expected_version: &str) -> Result<(), StoreError> {
    let prefixes: Vec<&str> = HspFamily::ALL.iter().map(|f| f.table()).collect();
    store.broker().with_write("store.init", |conn| {
        conn.execute_batch(schemas::SCHEMA_VERSION_TABLE)?;
        version::check_schema_version(conn, expected_version)?;
        for ddl in schemas::all_schemas(&prefixes) {
            conn.execute_batch(&ddl)?;
        }
        reference::seed_catalogs(conn)?;
        Ok(())
    })
}
