//! Astronomical catalog cross-reference
//!
//! Loads the SAC deep-sky and IAU star-name catalogs into SQLite and
//! builds a master alias index mapping every known spelling of an object
//! to one canonical name (cname). Image ingestion files each image under
//! `cname(OBJECT)`; gallery search resolves free text to cnames.

mod admin;
pub mod alias;
pub mod error;
pub mod loader;
pub mod lookup;
pub mod normalize;
pub mod resolver;
pub mod schema;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use admin::{DeepSkyObject, check_catalog_files};
pub use alias::aliases_of;
pub use error::CatalogError;
pub use loader::{FingerprintTable, divine, load_rows};
pub use normalize::prettyspace;
pub use resolver::build_index;
pub use types::{
    AliasEntry, BuildReport, CatalogBuildStats, CatalogKind, CatalogRow, CatalogStats,
    LoadedCatalog, TargetMatch,
};

use crate::module::store::Database;

/// Catalog handle: admin commands and lookups over one [`Database`]
#[derive(Debug, Clone)]
pub struct Catalog {
    db: Database,
    fingerprints: FingerprintTable,
}

impl Catalog {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            fingerprints: FingerprintTable::default(),
        }
    }

    /// Use these header fingerprints instead of the built-in ones
    pub fn with_fingerprints(mut self, fingerprints: FingerprintTable) -> Self {
        self.fingerprints = fingerprints;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
