//! FITS image record types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A single header card value, as dumped by the FITS reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl HeaderValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Int(i) => Some(*i as f64),
            HeaderValue::Float(f) => Some(*f),
            HeaderValue::Text(s) => s.trim().parse().ok(),
            HeaderValue::Bool(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Int(i) => Some(*i),
            HeaderValue::Float(f) => Some(*f as i64),
            HeaderValue::Text(s) => s.trim().parse().ok(),
            HeaderValue::Bool(_) => None,
        }
    }
}

impl std::fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderValue::Bool(b) => write!(f, "{}", b),
            HeaderValue::Int(i) => write!(f, "{}", i),
            HeaderValue::Float(x) => write!(f, "{}", x),
            HeaderValue::Text(s) => f.write_str(s),
        }
    }
}

/// Header cards by keyword (`OBJECT`, `DATE-OBS`, ...)
pub type FitsHeaders = BTreeMap<String, HeaderValue>;

/// One `ingest` input file: the image path and its primary image HDU headers
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderDump {
    pub path: PathBuf,
    pub headers: FitsHeaders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageType {
    /// Dark, bias or flat frame
    Calibration,
    Target,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Calibration => "Calibration",
            ImageType::Target => "Target",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Calibration" => Some(ImageType::Calibration),
            "Target" => Some(ImageType::Target),
            _ => None,
        }
    }
}

/// One row of the `fits` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitsRecord {
    pub path: String,
    /// Canonical catalog name, or a calibration meta-name like `Dark Frame 300s`
    pub target: String,
    /// `OBJECT` as written by the capture software
    pub object: String,
    /// `YYYY-MM-DD` (UTC)
    pub date: String,
    /// ISO 8601 `DATE-OBS`
    pub timestamp: String,
    pub filter: Option<String>,
    pub binning: Option<String>,
    pub exposure: Option<f64>,
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub preview: String,
    pub thumbnail: String,
    pub image_type: ImageType,
}

impl FitsRecord {
    /// Downscale factor giving a thumbnail about 128 pixels wide
    pub fn thumbnail_scale(&self) -> i64 {
        self.x.unwrap_or(0) / 128 + 1
    }
}

/// Image library summary for `status`
#[derive(Debug, Clone, Default)]
pub struct FitsStatus {
    pub total_images: usize,
    /// Most imaged first
    pub targets: Vec<(String, usize)>,
    pub dates: Vec<(String, usize)>,
}

impl std::fmt::Display for FitsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let join = |counts: &[(String, usize)]| {
            counts
                .iter()
                .map(|(name, n)| format!("{}({})", name, n))
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(f, "Database Status:\n  Total images: {}", self.total_images)?;
        writeln!(f, "  Targets: {} --> {}", self.targets.len(), join(&self.targets))?;
        write!(f, "  Dates: {} --> {}", self.dates.len(), join(&self.dates))
    }
}

/// Outcome of an `ingest` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub added: usize,
    /// Already in the library
    pub duplicates: usize,
    /// Unreadable or missing required headers
    pub failed: usize,
}
