//! Image ingestion from header dumps
//!
//! Each input is a JSON file `{"path": ..., "headers": {...}}` written by
//! the capture pipeline's FITS reader. Relative image paths are taken to
//! be under the configured FITS directory.

use std::path::{Path, PathBuf};

use super::error::FitsError;
use super::record::build_record;
use super::store::FitsStore;
use super::types::{FitsRecord, HeaderDump, IngestReport};
use crate::module::catalog::Catalog;

pub async fn read_header_dump(path: impl AsRef<Path>) -> Result<HeaderDump, FitsError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FitsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| FitsError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub struct Ingestor<'a> {
    catalog: &'a Catalog,
    store: &'a FitsStore,
    fits_path: PathBuf,
}

impl<'a> Ingestor<'a> {
    pub fn new(catalog: &'a Catalog, store: &'a FitsStore, fits_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            store,
            fits_path: fits_path.into(),
        }
    }

    /// Record for one header dump, with its target resolved through the catalog
    pub fn record_for(&self, dump: &HeaderDump) -> Result<FitsRecord, FitsError> {
        let path = if dump.path.is_absolute() {
            dump.path.clone()
        } else {
            self.fits_path.join(&dump.path)
        };
        build_record(&path, &dump.headers, |object| self.catalog.cname(object))
    }

    /// Ingest one header dump. `Ok(false)` when the image was already known.
    pub async fn ingest_file(&self, dump_path: &Path) -> Result<bool, FitsError> {
        let dump = read_header_dump(dump_path).await?;
        let record = self.record_for(&dump)?;
        tracing::info!("Importing {} as {}", record.path, record.target);
        self.store.insert(&record)
    }

    /// Ingest every file; per-file failures are logged and counted
    pub async fn ingest_all(&self, dump_paths: &[PathBuf]) -> IngestReport {
        let mut report = IngestReport::default();
        for dump_path in dump_paths {
            match self.ingest_file(dump_path).await {
                Ok(true) => report.added += 1,
                Ok(false) => report.duplicates += 1,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", dump_path.display(), e);
                    report.failed += 1;
                }
            }
        }
        tracing::info!("Successfully added {} images", report.added);
        report
    }
}
