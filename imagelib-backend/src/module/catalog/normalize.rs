//! Catalog text cleanup

use regex::Regex;
use std::sync::LazyLock;

static MULTISPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(" {2,}").unwrap());

/// Normalize a catalog cell: drop every `"`, trim surrounding spaces, and
/// collapse internal runs of spaces to one.
///
/// Idempotent: `prettyspace(&prettyspace(s)) == prettyspace(s)`.
pub fn prettyspace(text: &str) -> String {
    let unquoted = text.replace('"', "");
    MULTISPACE
        .replace_all(unquoted.trim_matches(' '), " ")
        .into_owned()
}
