//! Catalog file loader
//!
//! Catalog exports are downloaded by hand from their providers:
//! - SAC deep-sky database: https://www.saguaroastro.org/sac-downloads/
//! - IAU star names: https://www.iau.org/public/themes/naming_stars/
//!
//! A file is identified by the MD5 of its header line alone, so a silent
//! format change upstream fails loudly here instead of importing garbage.

use md5::{Digest, Md5};
use std::path::Path;

use super::error::CatalogError;
use super::normalize::prettyspace;
use super::types::{CatalogKind, CatalogRow, LoadedCatalog};

/// Hex MD5 of a header line
pub fn fingerprint(header_line: &str) -> String {
    hex::encode(Md5::digest(header_line.as_bytes()))
}

/// Known header fingerprints, one per catalog variant
#[derive(Debug, Clone)]
pub struct FingerprintTable {
    entries: Vec<(CatalogKind, String)>,
}

impl Default for FingerprintTable {
    fn default() -> Self {
        Self {
            entries: CatalogKind::ALL
                .iter()
                .map(|kind| (*kind, kind.format().fingerprint.to_string()))
                .collect(),
        }
    }
}

impl FingerprintTable {
    /// Replace the fingerprint for `kind`, eg after a provider re-export
    pub fn with_override(mut self, kind: CatalogKind, fingerprint: impl Into<String>) -> Self {
        let fingerprint = fingerprint.into().to_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = fingerprint,
            None => self.entries.push((kind, fingerprint)),
        }
        self
    }

    pub fn get(&self, kind: CatalogKind) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, fp)| fp.as_str())
    }

    /// Identify a catalog by its header line (terminator included)
    pub fn divine(&self, header_line: &str) -> Option<CatalogKind> {
        let digest = fingerprint(header_line);
        self.entries
            .iter()
            .find(|(_, fp)| *fp == digest)
            .map(|(kind, _)| *kind)
    }
}

/// Identify a catalog by its header line using the built-in fingerprints
pub fn divine(header_line: &str) -> Option<CatalogKind> {
    FingerprintTable::default().divine(header_line)
}

/// Split off the header line. A CRLF terminator is folded to LF so that
/// fingerprints do not depend on how the file was saved.
pub fn split_header(content: &str) -> (String, &str) {
    match content.find('\n') {
        Some(end) => {
            let line = content[..end].strip_suffix('\r').unwrap_or(&content[..end]);
            (format!("{}\n", line), &content[end + 1..])
        }
        None => (content.to_string(), ""),
    }
}

/// Parse the data lines (everything after the header) of a catalog.
///
/// Each physical line is one CSV record. Malformed lines, blank ones
/// included, are logged with their line number, counted, and skipped.
pub fn load_rows(body: &str, kind: CatalogKind) -> LoadedCatalog {
    let format = kind.format();
    let expected = format.schema.columns.len();

    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true);

    let mut loaded = LoadedCatalog {
        kind,
        rows: Vec::new(),
        lines_read: 0,
        skipped_lines: 0,
    };

    for (index, line) in body.lines().enumerate() {
        loaded.lines_read += 1;
        // +2: 1-based, after the header line consumed by `split_header`
        let linenum = index + 2;

        let mut fields: Vec<String> = match builder.from_reader(line.as_bytes()).records().next() {
            Some(Ok(record)) => record.iter().map(prettyspace).collect(),
            Some(Err(e)) => {
                loaded.skipped_lines += 1;
                tracing::warn!(
                    "Unreadable {} catalog record at line {}: {}; skipping",
                    kind,
                    linenum,
                    e
                );
                continue;
            }
            None => Vec::new(),
        };
        (format.post_process)(&mut fields);

        if fields.len() != expected {
            loaded.skipped_lines += 1;
            tracing::warn!(
                "Wrong number of fields at line {}; skipping (found {} expected {})",
                linenum,
                fields.len(),
                expected
            );
            continue;
        }

        loaded.rows.push(CatalogRow {
            kind,
            source_id: None,
            fields,
        });
    }

    tracing::debug!(
        "Parsed {} {} rows from {} lines ({} skipped)",
        loaded.rows.len(),
        kind,
        loaded.lines_read,
        loaded.skipped_lines
    );

    loaded
}

/// Parse a complete catalog file held in memory
pub fn parse_catalog(
    path: &Path,
    content: &str,
    fingerprints: &FingerprintTable,
) -> Result<LoadedCatalog, CatalogError> {
    let (header, body) = split_header(content);
    let kind = fingerprints
        .divine(&header)
        .ok_or_else(|| CatalogError::UnrecognizedFormat {
            path: path.to_path_buf(),
            fingerprint: fingerprint(&header),
        })?;
    tracing::info!("Divined {} as {} catalog", path.display(), kind);
    Ok(load_rows(body, kind))
}

/// Read and parse a catalog file from disk
pub async fn read_catalog_file(
    path: impl AsRef<Path>,
    fingerprints: &FingerprintTable,
) -> Result<LoadedCatalog, CatalogError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            CatalogError::MissingFile(path.to_path_buf())
        } else {
            CatalogError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let content = String::from_utf8_lossy(&bytes);
    parse_catalog(path, &content, fingerprints)
}
