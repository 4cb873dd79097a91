//! Catalog data types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::schema::{IAU_CATALOG, SAC_CATALOG, TableSchema};

/// The source catalogs the alias index is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    /// Saguaro Astronomy Club deep-sky database
    DeepSky,
    /// IAU Catalog of Star Names
    NamedStar,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 2] = [CatalogKind::DeepSky, CatalogKind::NamedStar];

    pub fn format(&self) -> &'static CatalogFormat {
        match self {
            CatalogKind::DeepSky => &DEEP_SKY,
            CatalogKind::NamedStar => &NAMED_STAR,
        }
    }

    /// Short operator-facing label
    pub fn label(&self) -> &'static str {
        self.format().label
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything that differs between the catalog variants
#[derive(Debug)]
pub struct CatalogFormat {
    pub kind: CatalogKind,
    pub label: &'static str,
    pub schema: &'static TableSchema,
    /// Columns whose `;`-separated contents are target names, in priority order
    pub name_fields: &'static [&'static str],
    /// MD5 of the header line as published by the provider
    pub fingerprint: &'static str,
    /// Fix-ups applied after normalization and before the column count check
    pub post_process: fn(&mut Vec<String>),
}

pub static DEEP_SKY: CatalogFormat = CatalogFormat {
    kind: CatalogKind::DeepSky,
    label: "sac",
    schema: &SAC_CATALOG,
    name_fields: &["object", "other"],
    fingerprint: "ba5a59bfcf97d6aa588404ad4b479694",
    post_process: no_fixups,
};

pub static NAMED_STAR: CatalogFormat = CatalogFormat {
    kind: CatalogKind::NamedStar,
    label: "iau",
    schema: &IAU_CATALOG,
    name_fields: &["name", "designation", "hip", "bayer"],
    fingerprint: "18836c4bd7c694568f0d830f5e38e409",
    post_process: named_star_fixups,
};

fn no_fixups(_fields: &mut Vec<String>) {}

/// `_`/`-` mark a missing value in the IAU export
fn is_placeholder(value: &str) -> bool {
    value.is_empty() || value.starts_with(['_', '-'])
}

/// IAU export quirks: a null leading column, bare HIP numbers, and the
/// multiple-star component split from the Bayer name (eg `α Cen` + `A`).
///
/// Placeholder HIP and Bayer values are cleared so they are stored as
/// NULL and stay out of the UNIQUE indexes.
fn named_star_fixups(fields: &mut Vec<String>) {
    if fields.is_empty() {
        return;
    }
    fields.remove(0);

    if let Some(hip) = fields.get_mut(2) {
        if is_placeholder(hip) {
            hip.clear();
        } else {
            *hip = format!("HIP {}", hip);
        }
    }

    let component = fields.get(4).filter(|c| !is_placeholder(c)).cloned();
    if let Some(bayer) = fields.get_mut(3) {
        if is_placeholder(bayer) {
            bayer.clear();
        } else if let Some(component) = component {
            bayer.push(' ');
            bayer.push_str(&component);
        }
    }
}

/// One record of a source catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub kind: CatalogKind,
    /// Primary key in the catalog's table; `None` until stored
    pub source_id: Option<i64>,
    /// Field values in the order of the catalog's column list
    pub fields: Vec<String>,
}

impl CatalogRow {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.kind
            .format()
            .schema
            .position(name)
            .and_then(|i| self.fields.get(i))
            .map(String::as_str)
    }

    /// Values of the name-bearing fields, in priority order
    pub fn name_values(&self) -> impl Iterator<Item = &str> + '_ {
        self.kind
            .format()
            .name_fields
            .iter()
            .filter_map(|name| self.field(name))
    }
}

/// Result of parsing one catalog file
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub kind: CatalogKind,
    pub rows: Vec<CatalogRow>,
    /// Data lines seen after the header
    pub lines_read: usize,
    /// Data lines dropped for a wrong field count or bad quoting
    pub skipped_lines: usize,
}

/// One row of the master alias index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasEntry {
    pub target: String,
    pub cname: String,
    pub source_table: String,
    pub source_id: i64,
}

/// Per-catalog tallies for one build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogBuildStats {
    pub lines_read: usize,
    pub skipped_lines: usize,
    pub rows_inserted: usize,
    pub duplicate_rows: usize,
    pub aliases_inserted: usize,
    pub duplicate_aliases: usize,
}

/// Operator report for `create`/`recreate`
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub catalogs: BTreeMap<CatalogKind, CatalogBuildStats>,
}

impl BuildReport {
    pub fn entry(&mut self, kind: CatalogKind) -> &mut CatalogBuildStats {
        self.catalogs.entry(kind).or_default()
    }

    pub fn stats(&self, kind: CatalogKind) -> CatalogBuildStats {
        self.catalogs.get(&kind).cloned().unwrap_or_default()
    }

    /// Total alias rows written across all catalogs
    pub fn alias_count(&self) -> usize {
        self.catalogs.values().map(|s| s.aliases_inserted).sum()
    }

    /// Alias spellings skipped because another row already claimed them
    pub fn duplicate_count(&self) -> usize {
        self.catalogs.values().map(|s| s.duplicate_aliases).sum()
    }

    pub fn skipped_lines(&self) -> usize {
        self.catalogs.values().map(|s| s.skipped_lines).sum()
    }
}

impl std::fmt::Display for BuildReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (kind, s) in &self.catalogs {
            writeln!(
                f,
                "{}: {} lines read, {} skipped, {} rows added, {} duplicate rows, \
                 {} aliases added, {} duplicate aliases",
                kind,
                s.lines_read,
                s.skipped_lines,
                s.rows_inserted,
                s.duplicate_rows,
                s.aliases_inserted,
                s.duplicate_aliases
            )?;
        }
        write!(
            f,
            "{} target aliases added, {} duplicates skipped",
            self.alias_count(),
            self.duplicate_count()
        )
    }
}

/// Outcome of a free-text target search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetMatch {
    /// No query given: every target matches
    All,
    /// The query is itself a known alias
    Exact(Vec<String>),
    /// Case-insensitive substring hits, used only when there was no exact hit
    Fuzzy(Vec<String>),
}

impl TargetMatch {
    /// Canonical names to filter by, or `None` for "everything"
    pub fn targets(&self) -> Option<&[String]> {
        match self {
            TargetMatch::All => None,
            TargetMatch::Exact(t) | TargetMatch::Fuzzy(t) => Some(t),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.targets().is_some_and(|t| t.is_empty())
    }
}

/// Catalog contents summary for `stats`
#[derive(Debug, Clone, Default)]
pub struct CatalogStats {
    pub total_objects: usize,
    pub total_aliases: usize,
    /// Deep-sky object types, most common first
    pub counts_by_type: Vec<(String, usize)>,
    /// Constellations over both catalogs, most common first
    pub counts_by_constellation: Vec<(String, usize)>,
}

impl std::fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "The catalog contains {} objects with {} aliases",
            self.total_objects, self.total_aliases
        )?;
        writeln!(f, "\nThere are {} types of objects:", self.counts_by_type.len())?;
        write_grid(f, &self.counts_by_type)?;
        writeln!(
            f,
            "\n{} constellations are represented:",
            self.counts_by_constellation.len()
        )?;
        write_grid(f, &self.counts_by_constellation)
    }
}

fn write_grid(f: &mut std::fmt::Formatter<'_>, counts: &[(String, usize)]) -> std::fmt::Result {
    const PER_LINE: usize = 8;
    for line in counts.chunks(PER_LINE) {
        for (name, count) in line {
            write!(f, "{:5} {:10}", count, name)?;
        }
        writeln!(f)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iau_line(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_named_star_fixups() {
        let mut fields = iau_line(&["", "Rigil Kentaurus", "HR 5459", "71683", "α Cen", "A", "x"]);
        named_star_fixups(&mut fields);
        assert_eq!(fields[0], "Rigil Kentaurus");
        assert_eq!(fields[2], "HIP 71683");
        assert_eq!(fields[3], "α Cen A");
        assert_eq!(fields.len(), 6);
    }

    #[test]
    fn test_named_star_placeholder_component() {
        let mut fields = iau_line(&["", "Sirius", "HR 2491", "", "α CMa", "_"]);
        named_star_fixups(&mut fields);
        assert_eq!(fields[2], "");
        assert_eq!(fields[3], "α CMa");
    }

    #[test]
    fn test_named_star_placeholders_cleared() {
        let mut fields = iau_line(&["", "Ogma", "HD 149026", "_", "_", "_"]);
        named_star_fixups(&mut fields);
        assert_eq!(fields[2], "");
        assert_eq!(fields[3], "");

        let mut fields = iau_line(&["", "Dimidium", "51 Peg", "-", "_ Peg", "A"]);
        named_star_fixups(&mut fields);
        assert_eq!(fields[2], "");
        assert_eq!(fields[3], "");
    }

    #[test]
    fn test_row_name_values() {
        let mut fields = vec![String::new(); SAC_CATALOG.columns.len()];
        fields[0] = "M 1".to_string();
        fields[1] = "NGC 1952;Crab Nebula".to_string();
        fields[2] = "SNR".to_string();
        let row = CatalogRow { kind: CatalogKind::DeepSky, source_id: None, fields };

        assert_eq!(row.field("type"), Some("SNR"));
        assert_eq!(row.field("nope"), None);
        let names: Vec<&str> = row.name_values().collect();
        assert_eq!(names, vec!["M 1", "NGC 1952;Crab Nebula"]);
    }

    #[test]
    fn test_target_match_targets() {
        assert_eq!(TargetMatch::All.targets(), None);
        assert!(!TargetMatch::All.is_empty());
        assert!(TargetMatch::Fuzzy(vec![]).is_empty());
        let exact = TargetMatch::Exact(vec!["M 42".to_string()]);
        assert_eq!(exact.targets().unwrap(), ["M 42".to_string()]);
    }

    #[test]
    fn test_report_totals() {
        let mut report = BuildReport::default();
        report.entry(CatalogKind::DeepSky).aliases_inserted = 3;
        report.entry(CatalogKind::NamedStar).aliases_inserted = 2;
        report.entry(CatalogKind::NamedStar).duplicate_aliases = 1;
        assert_eq!(report.alias_count(), 5);
        assert_eq!(report.duplicate_count(), 1);
        assert!(report.to_string().ends_with("5 target aliases added, 1 duplicates skipped"));
    }
}
