//! FITS header -> database record
//!
//! Only the salient headers are read: NAXIS1/2, EXPTIME, IMAGETYP,
//! X/YBINNING, FILTER, OBJECT and DATE-OBS.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use super::error::FitsError;
use super::types::{FitsHeaders, FitsRecord, HeaderValue, ImageType};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
/// Some cameras report hundredths of seconds; ISO 8601 wants thousandths
static HUNDREDTHS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\d\d$").unwrap());

pub const NO_TARGET: &str = "No Target";

/// Lower-cased `IMAGETYP` -> calibration target prefix
pub fn calibration_frame(image_type: &str) -> Option<&'static str> {
    match image_type.trim().to_lowercase().as_str() {
        "dark" | "dark frame" | "dark field" => Some("Dark Frame"),
        "bias" | "bias frame" | "bias field" => Some("Bias Frame"),
        "flat" | "flat frame" | "flat field" => Some("Flat Frame"),
        _ => None,
    }
}

/// `DATE-OBS` as ISO 8601 with millisecond precision
pub fn normalize_timestamp(value: &str) -> String {
    let value = value.trim();
    if HUNDREDTHS.is_match(value) {
        format!("{}0", value)
    } else {
        value.to_string()
    }
}

fn observation_date(path: &Path, timestamp: &str) -> Result<String, FitsError> {
    let bare = timestamp.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(bare, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(bare, "%Y-%m-%d"))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| FitsError::InvalidTimestamp {
            path: path.to_path_buf(),
            value: timestamp.to_string(),
        })
}

/// `foo/M42_001.fits` -> (`foo/M42_001.png`, `foo/M42_001-thumb.png`)
pub fn preview_paths(path: &Path) -> (String, String) {
    let preview = path.with_extension("png");
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let thumbnail = path.with_file_name(format!("{}-thumb.png", stem));
    (
        preview.to_string_lossy().into_owned(),
        thumbnail.to_string_lossy().into_owned(),
    )
}

/// Translate FITS headers into a `fits` table record.
///
/// `resolve` maps an `OBJECT` name to its canonical target, normally
/// [`Catalog::cname`](crate::module::catalog::Catalog::cname).
pub fn build_record(
    path: &Path,
    headers: &FitsHeaders,
    resolve: impl Fn(&str) -> String,
) -> Result<FitsRecord, FitsError> {
    let text = |key: &str| headers.get(key).map(HeaderValue::to_string);

    let timestamp = text("DATE-OBS")
        .map(|v| normalize_timestamp(&v))
        .ok_or_else(|| FitsError::MissingHeader {
            path: path.to_path_buf(),
            key: "DATE-OBS",
        })?;
    let date = observation_date(path, &timestamp)?;

    let object = text("OBJECT")
        .map(|o| WHITESPACE.replace_all(&o, " ").trim().to_string())
        .filter(|o| !o.is_empty())
        .unwrap_or_else(|| NO_TARGET.to_string());

    let exposure = headers.get("EXPTIME").and_then(HeaderValue::as_f64);

    let (target, image_type) = match text("IMAGETYP").as_deref().and_then(calibration_frame) {
        Some(frame) => {
            let seconds = exposure.ok_or_else(|| FitsError::MissingHeader {
                path: path.to_path_buf(),
                key: "EXPTIME",
            })?;
            (format!("{} {}s", frame, seconds as i64), ImageType::Calibration)
        }
        None => (resolve(&object), ImageType::Target),
    };

    let binning = match (headers.get("XBINNING"), headers.get("YBINNING")) {
        (Some(x), Some(y)) => Some(format!("{}x{}", x, y)),
        _ => None,
    };
    let (x, y) = match (headers.get("NAXIS1"), headers.get("NAXIS2")) {
        (Some(x), Some(y)) => (x.as_i64(), y.as_i64()),
        _ => (None, None),
    };
    let (preview, thumbnail) = preview_paths(path);

    Ok(FitsRecord {
        path: path.to_string_lossy().into_owned(),
        target,
        object,
        date,
        timestamp,
        filter: text("FILTER").map(|f| f.trim().to_string()),
        binning,
        exposure,
        x,
        y,
        preview,
        thumbnail,
        image_type,
    })
}
