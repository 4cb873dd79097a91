//! Catalog admin commands: create, recreate, stats
//!
//! Both catalog files are read and validated before the database is
//! touched. Table creation, source rows, and the alias index are then
//! written in a single transaction, so an aborted build leaves the
//! previous catalog in place.

use rusqlite::{Connection, params_from_iter};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::Catalog;
use super::error::CatalogError;
use super::loader::read_catalog_file;
use super::resolver::build_index;
use super::schema::{ALIAS_INDEX, ALL_TABLES, ColumnType, SAC_CATALOG};
use super::types::{BuildReport, CatalogKind, CatalogStats, LoadedCatalog};
use crate::module::store::{StoreError, StoreResult};

/// A deep-sky catalog entry, as listed by `query --field type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeepSkyObject {
    pub object: String,
    pub other: String,
    pub object_type: String,
    pub constellation: String,
    pub magnitude: String,
}

/// Confirm every input file exists before anything is dropped
pub fn check_catalog_files(paths: &[PathBuf]) -> Result<(), CatalogError> {
    let missing: Vec<&PathBuf> = paths.iter().filter(|p| !p.exists()).collect();
    for path in &missing {
        tracing::error!("{}: file not found", path.display());
    }
    match missing.first() {
        Some(path) => Err(CatalogError::MissingFile((*path).clone())),
        None => Ok(()),
    }
}

fn create_tables(conn: &Connection) -> StoreResult<()> {
    for table in ALL_TABLES {
        if table.create(conn)? {
            tracing::info!("Table {} created", table.name);
        } else {
            tracing::info!(
                "Table {} already exists; adding to it (use `recreate` to start over)",
                table.name
            );
        }
    }
    Ok(())
}

fn drop_tables(conn: &Connection) -> StoreResult<()> {
    for table in ALL_TABLES {
        if table.drop_table(conn)? {
            tracing::info!("Table {} dropped", table.name);
        } else {
            tracing::warn!("Table {} did not exist; you meant maybe `create` instead?", table.name);
        }
    }
    Ok(())
}

/// Insert the parsed rows of one catalog into its source table
fn populate_table(
    conn: &Connection,
    loaded: &LoadedCatalog,
    report: &mut BuildReport,
) -> StoreResult<()> {
    let schema = loaded.kind.format().schema;
    tracing::info!("Populating {} catalog ({} rows)", loaded.kind, loaded.rows.len());

    let stats = report.entry(loaded.kind);
    stats.lines_read += loaded.lines_read;
    stats.skipped_lines += loaded.skipped_lines;

    let mut stmt = conn.prepare(&schema.insert_sql())?;
    for row in &loaded.rows {
        let values = row.fields.iter().zip(schema.columns).map(|(value, column)| {
            if column.ty == ColumnType::OptionalText && value.is_empty() {
                None
            } else {
                Some(value.as_str())
            }
        });

        match stmt.execute(params_from_iter(values)) {
            Ok(_) => stats.rows_inserted += 1,
            Err(e) => match StoreError::from(e) {
                StoreError::UniqueViolation(msg) => {
                    stats.duplicate_rows += 1;
                    tracing::warn!(
                        "Duplicate {} entry {:?} ({}); skipping",
                        loaded.kind,
                        row.fields.first().map(String::as_str).unwrap_or_default(),
                        msg
                    );
                }
                other => return Err(other),
            },
        }
    }

    tracing::info!("{} {} catalog entries added", stats.rows_inserted, loaded.kind);
    Ok(())
}

fn count(conn: &Connection, sql: &str) -> StoreResult<usize> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n as usize)
}

fn grouped_counts(conn: &Connection, sql: &str) -> StoreResult<Vec<(String, usize)>> {
    let mut stmt = conn.prepare(sql)?;
    let counts = stmt
        .query_map([], |row| {
            let name: Option<String> = row.get(0)?;
            let n: i64 = row.get(1)?;
            Ok((name.unwrap_or_default(), n as usize))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(counts)
}

impl Catalog {
    /// Read, divine, and parse every file; report all rejects together
    async fn load_files(&self, paths: &[PathBuf]) -> Result<Vec<LoadedCatalog>, CatalogError> {
        let mut loaded = Vec::with_capacity(paths.len());
        let mut rejected = 0;
        for path in paths {
            tracing::info!("Divining catalog type of {}", path.display());
            match read_catalog_file(path, &self.fingerprints).await {
                Ok(catalog) => loaded.push(catalog),
                Err(e @ CatalogError::UnrecognizedFormat { .. }) => {
                    tracing::error!("{}", e);
                    rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }
        if rejected > 0 {
            return Err(CatalogError::Rejected { count: rejected });
        }
        Ok(loaded)
    }

    async fn build_from(
        &self,
        paths: &[PathBuf],
        drop_first: bool,
    ) -> Result<BuildReport, CatalogError> {
        check_catalog_files(paths)?;
        let loaded = self.load_files(paths).await?;

        let mut report = BuildReport::default();
        self.db.transaction(|tx| {
            if drop_first {
                drop_tables(tx)?;
            }
            create_tables(tx)?;
            for table in ALL_TABLES {
                table.validate(tx)?;
            }
            for catalog in &loaded {
                populate_table(tx, catalog, &mut report)?;
            }
            build_index(tx, &mut report)?;
            Ok::<(), CatalogError>(())
        })?;

        tracing::info!("Catalog build complete: {}", report);
        Ok(report)
    }

    /// Create missing tables and load both catalogs into them.
    ///
    /// Running this over an existing catalog is harmless: every row and
    /// alias is reported as a duplicate.
    pub async fn build(
        &self,
        sac: impl AsRef<Path>,
        iau: impl AsRef<Path>,
    ) -> Result<BuildReport, CatalogError> {
        let paths = [sac.as_ref().to_path_buf(), iau.as_ref().to_path_buf()];
        self.build_from(&paths, false).await
    }

    /// Drop all catalog tables, then `build`
    pub async fn rebuild(
        &self,
        sac: impl AsRef<Path>,
        iau: impl AsRef<Path>,
    ) -> Result<BuildReport, CatalogError> {
        let paths = [sac.as_ref().to_path_buf(), iau.as_ref().to_path_buf()];
        self.build_from(&paths, true).await
    }

    /// Verify the live tables match the static schema
    pub fn validate_schema(&self) -> Result<(), CatalogError> {
        let conn = self.db.lock();
        for table in ALL_TABLES {
            table.validate(&conn)?;
        }
        Ok(())
    }

    pub fn stats(&self) -> Result<CatalogStats, CatalogError> {
        self.validate_schema()?;
        let conn = self.db.lock();
        Ok(CatalogStats {
            total_objects: count(&conn, "SELECT count(*) FROM sac_catalog")?
                + count(&conn, "SELECT count(*) FROM iau_catalog")?,
            total_aliases: count(&conn, &format!("SELECT count(*) FROM {}", ALIAS_INDEX.name))?,
            counts_by_type: grouped_counts(
                &conn,
                "SELECT type, count(*) FROM sac_catalog GROUP BY 1 ORDER BY 2 DESC, 1",
            )?,
            counts_by_constellation: grouped_counts(
                &conn,
                "SELECT con, count(*) FROM \
                 (SELECT con FROM sac_catalog UNION ALL SELECT con FROM iau_catalog) \
                 GROUP BY 1 ORDER BY 2 DESC, 1",
            )?,
        })
    }

    /// Deep-sky objects of one SAC type (eg `GALXY`, `PLNNB`)
    pub fn objects_of_type(&self, object_type: &str) -> Result<Vec<DeepSkyObject>, CatalogError> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT object, other, type, con, mag FROM {} WHERE type = ?1 ORDER BY id",
            SAC_CATALOG.name
        ))?;
        let objects = stmt
            .query_map([object_type], |row| {
                Ok(DeepSkyObject {
                    object: row.get(0)?,
                    other: row.get(1)?,
                    object_type: row.get(2)?,
                    constellation: row.get(3)?,
                    magnitude: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(objects)
    }

    /// Row counts of the source tables that exist, printed after `create`
    pub fn source_counts(&self) -> Result<Vec<(CatalogKind, usize)>, CatalogError> {
        let conn = self.db.lock();
        let mut counts = Vec::new();
        for kind in CatalogKind::ALL {
            let table = kind.format().schema;
            if table.exists(&conn)? {
                counts.push((kind, count(&conn, &format!("SELECT count(*) FROM {}", table.name))?));
            }
        }
        Ok(counts)
    }
}
