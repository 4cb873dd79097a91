use std::path::PathBuf;
use thiserror::Error;

use crate::module::store::StoreError;

#[derive(Debug, Error)]
pub enum FitsError {
    #[error("no {key} header in {}; skipping", .path.display())]
    MissingHeader { path: PathBuf, key: &'static str },

    #[error("bad DATE-OBS {value:?} in {}", .path.display())]
    InvalidTimestamp { path: PathBuf, value: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad header dump {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for FitsError {
    fn from(err: rusqlite::Error) -> Self {
        FitsError::Store(StoreError::from(err))
    }
}
