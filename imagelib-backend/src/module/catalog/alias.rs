//! Alias extraction
//!
//! Turns the name-bearing cells of a catalog row into the ordered list of
//! target names it answers to. Element 0 is the row's canonical name.

use regex::Regex;
use std::sync::LazyLock;

use super::types::CatalogRow;

/// `M 1`, `M42`: Messier designations win the canonical slot
static MESSIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^M\s*\d+$").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
/// SAC writes MCG designations with random spacing and an intermittent hyphen
/// (https://heasarc.gsfc.nasa.gov/W3Browse/galaxy-catalog/mcg.html)
static MCG_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^MCG(\d)").unwrap());

pub fn is_messier(name: &str) -> bool {
    MESSIER.is_match(name)
}

/// `MCG +07 - 26 - 012` -> `MCG+07-26-012`, `MCG7-26-12` -> `MCG-7-26-12`
pub fn repair_mcg(name: &str) -> String {
    let compact = WHITESPACE.replace_all(name, "");
    MCG_PREFIX.replace(&compact, "MCG-$1").into_owned()
}

/// Alias list for a catalog row; empty when the row has no usable names.
pub fn aliases_of(row: &CatalogRow) -> Vec<String> {
    split_aliases(row.name_values())
}

/// Split name cells on `;` into candidate names.
///
/// Candidates starting with `_` or `-` are placeholders (eg IAU Bayer
/// names without a Greek letter) and are dropped. The last Messier
/// designation seen is moved to the front.
pub fn split_aliases<'a>(cells: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut aliases: Vec<String> = Vec::new();

    for cell in cells {
        for candidate in cell.split(';').map(str::trim) {
            if candidate.is_empty() || candidate.starts_with(['_', '-']) {
                continue;
            }

            let candidate = if candidate.starts_with("MCG") {
                repair_mcg(candidate)
            } else {
                candidate.to_string()
            };

            let messier = is_messier(&candidate);
            aliases.push(candidate);
            if messier {
                let last = aliases.len() - 1;
                aliases.swap(0, last);
            }
        }
    }

    aliases
}
