//! Command handlers for the `imagelib` CLI
//!
//! Each handler returns the text to print, so `main` only dispatches.

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::module::catalog::{BuildReport, Catalog};
use crate::module::fits::{FitsStore, Ingestor};
use crate::module::store::Database;

/// Which column `query` searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryField {
    /// Any alias spelling; exact first, then substring
    Target,
    /// SAC object type, eg GALXY or PLNNB
    Type,
}

pub struct App {
    config: AppConfig,
    catalog: Catalog,
    images: FitsStore,
}

impl App {
    pub fn open(config: AppConfig) -> Result<Self> {
        let db = Database::open(&config.database)
            .with_context(|| format!("Failed to open database {}", config.database.display()))?;
        Ok(Self::with_database(config, db))
    }

    pub fn with_database(config: AppConfig, db: Database) -> Self {
        let catalog = Catalog::new(db.clone()).with_fingerprints(config.fingerprint_table());
        Self {
            config,
            catalog,
            images: FitsStore::new(db),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Build report followed by the resulting source table sizes
    fn build_summary(&self, report: &BuildReport) -> Result<String> {
        let mut out = report.to_string();
        for (kind, rows) in self.catalog.source_counts()? {
            write!(out, "\n{} catalog now holds {} objects", kind, rows)?;
        }
        Ok(out)
    }

    pub async fn create(&self, sac: &Path, iau: &Path) -> Result<String> {
        let report = self.catalog.build(sac, iau).await?;
        self.build_summary(&report)
    }

    pub async fn recreate(&self, sac: &Path, iau: &Path) -> Result<String> {
        let report = self.catalog.rebuild(sac, iau).await?;
        self.build_summary(&report)
    }

    pub fn stats(&self) -> Result<String> {
        Ok(self.catalog.stats()?.to_string())
    }

    pub fn query(&self, field: QueryField, term: &str) -> Result<String> {
        let mut out = String::new();
        match field {
            QueryField::Target => {
                let hits = self.catalog.aliases_matching(term)?;
                for hit in &hits {
                    writeln!(out, "{:30} -> {:20} ({})", hit.target, hit.cname, hit.source_table)?;
                }
                write!(out, "{} aliases found", hits.len())?;
            }
            QueryField::Type => {
                let objects = self.catalog.objects_of_type(term)?;
                for o in &objects {
                    writeln!(
                        out,
                        "{:12} {:6} {:5} {}",
                        o.object, o.constellation, o.magnitude, o.other
                    )?;
                }
                write!(out, "{} objects of type {}", objects.len(), term)?;
            }
        }
        Ok(out)
    }

    pub fn cname(&self, name: &str) -> String {
        self.catalog.cname(name)
    }

    /// Images for a free-text target query, newest first
    pub fn search(&self, query: Option<&str>, limit: usize) -> Result<String> {
        self.images.create_schema()?;
        let targets = self.catalog.resolve_targets(query)?;
        let images = self.images.find_images(&targets, limit)?;

        let mut out = String::new();
        for image in &images {
            writeln!(
                out,
                "{} {:24} {:6} {:>7} {}",
                image.date,
                image.target,
                image.filter.as_deref().unwrap_or("-"),
                image.exposure.map(|e| format!("{}s", e)).unwrap_or_default(),
                image.path
            )?;
        }
        write!(out, "{} images", images.len())?;
        Ok(out)
    }

    pub async fn ingest(&self, dumps: &[PathBuf]) -> Result<String> {
        self.images.create_schema()?;
        let ingestor = Ingestor::new(&self.catalog, &self.images, &self.config.fits_path);
        let report = ingestor.ingest_all(dumps).await;
        Ok(format!(
            "Successfully added {} images ({} already present, {} failed)",
            report.added, report.duplicates, report.failed
        ))
    }

    pub fn status(&self) -> Result<String> {
        self.images.create_schema()?;
        Ok(self.images.status()?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::catalog::fixtures::{
        iau_file, iau_line, sac_file, sac_line_in, test_fingerprints,
    };

    async fn app_with_catalog(dir: &Path) -> App {
        let app = App::with_database(AppConfig::default(), Database::open_in_memory().unwrap());
        let app = App {
            catalog: app.catalog.with_fingerprints(test_fingerprints()),
            ..app
        };

        let sac = dir.join("sac.txt");
        let iau = dir.join("iau.csv");
        std::fs::write(
            &sac,
            sac_file(&[
                sac_line_in("M 42", "NGC 1976;Orion Nebula", "BRTNB", "ORI"),
                sac_line_in("M 31", "NGC 224;Andromeda Galaxy", "GALXY", "AND"),
            ]),
        )
        .unwrap();
        let stars = iau_file(&[iau_line("Betelgeuse", "HR 2061", "27989", "α Ori", "")]);
        std::fs::write(&iau, stars).unwrap();

        let out = app.create(&sac, &iau).await.unwrap();
        assert!(out.contains("10 target aliases added, 0 duplicates skipped"));
        assert!(out.contains("\nsac catalog now holds 2 objects"));
        assert!(out.ends_with("\niau catalog now holds 1 objects"));
        app
    }

    #[tokio::test]
    async fn test_query_and_cname() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_catalog(dir.path()).await;

        assert_eq!(app.cname("Orion Nebula"), "M 42");
        assert_eq!(app.cname("HIP 27989"), "Betelgeuse");

        let out = app.query(QueryField::Target, "nebula").unwrap();
        assert!(out.contains("Orion Nebula"));
        assert!(out.ends_with("1 aliases found"));

        let out = app.query(QueryField::Type, "GALXY").unwrap();
        assert!(out.starts_with("M 31"));
        assert!(out.ends_with("1 objects of type GALXY"));

        assert!(app.stats().unwrap().contains("3 objects with 10 aliases"));
    }

    #[tokio::test]
    async fn test_ingest_then_search() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_catalog(dir.path()).await;

        let dump = dir.path().join("m42.json");
        std::fs::write(
            &dump,
            r#"{"path": "/data/m42_001.fits",
                "headers": {"OBJECT": "NGC 1976", "DATE-OBS": "2023-01-01T03:00:00", "FILTER": "L", "EXPTIME": 30}}"#,
        )
        .unwrap();
        let out = app.ingest(&[dump]).await.unwrap();
        assert_eq!(out, "Successfully added 1 images (0 already present, 0 failed)");

        let out = app.search(Some("Orion Nebula"), 10).unwrap();
        assert!(out.contains("M 42"));
        assert!(out.contains("/data/m42_001.fits"));
        assert!(out.ends_with("1 images"));

        assert!(app.search(Some("Andromeda"), 10).unwrap().ends_with("0 images"));
        assert!(app.status().unwrap().contains("Total images: 1"));
    }
}
