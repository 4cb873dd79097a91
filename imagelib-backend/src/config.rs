use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::module::catalog::{CatalogKind, FingerprintTable};

pub const DEFAULT_CONFIG_FILE: &str = "imagelib.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite file shared by the catalog and the image library
    #[serde(default = "default_database")]
    pub database: PathBuf,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Root of the FITS image tree; relative image paths are resolved here
    #[serde(default = "default_fits_path")]
    pub fits_path: PathBuf,

    #[serde(default)]
    pub fingerprints: FingerprintConfig,
}

/// Header fingerprint overrides, for when a provider re-exports a catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FingerprintConfig {
    pub sac: Option<String>,
    pub iau: Option<String>,
}

fn default_database() -> PathBuf {
    PathBuf::from("fits.db")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fits_path() -> PathBuf {
    PathBuf::from("Eagle")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            log_dir: default_log_dir(),
            log_level: default_log_level(),
            fits_path: default_fits_path(),
            fingerprints: FingerprintConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Read `path`, or fall back to defaults if it is the default file and absent
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn fingerprint_table(&self) -> FingerprintTable {
        let mut table = FingerprintTable::default();
        if let Some(fp) = &self.fingerprints.sac {
            table = table.with_override(CatalogKind::DeepSky, fp.as_str());
        }
        if let Some(fp) = &self.fingerprints.iau {
            table = table.with_override(CatalogKind::NamedStar, fp.as_str());
        }
        table
    }
}
