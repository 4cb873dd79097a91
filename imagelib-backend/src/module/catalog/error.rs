use std::path::PathBuf;
use thiserror::Error;

use crate::module::store::StoreError;

/// Errors that abort a catalog admin command.
///
/// Malformed lines and duplicate names are not errors; they are tallied
/// in the build report instead.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("cannot divine catalog type for {} (md5: {fingerprint})", .path.display())]
    UnrecognizedFormat { path: PathBuf, fingerprint: String },

    #[error("{count} catalog file(s) rejected; nothing was written")]
    Rejected { count: usize },

    #[error("table {table} does not match the expected schema (expected {expected:?}, found {found:?})")]
    SchemaMismatch {
        table: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        CatalogError::Store(StoreError::from(err))
    }
}
