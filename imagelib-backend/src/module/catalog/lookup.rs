//! Query-time catalog lookups
//!
//! Used once per image at ingestion time (`cname`) and many times per
//! gallery request (`resolve_targets`). Read-only.

use rusqlite::{Connection, OptionalExtension};

use super::Catalog;
use super::error::CatalogError;
use super::types::{AliasEntry, TargetMatch};
use crate::module::store::StoreResult;

/// Escape LIKE wildcards so the query is matched literally
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn lookup_cname(conn: &Connection, target: &str) -> StoreResult<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT cname FROM catalog WHERE target = ?1",
            [target],
            |row| row.get(0),
        )
        .optional()?)
}

fn exact_cnames(conn: &Connection, query: &str) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT DISTINCT cname FROM catalog WHERE target = ?1 ORDER BY cname",
    )?;
    let cnames = stmt
        .query_map([query], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(cnames)
}

fn fuzzy_cnames(conn: &Connection, query: &str) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT DISTINCT cname FROM catalog WHERE target LIKE ?1 ESCAPE '\\' ORDER BY cname",
    )?;
    let cnames = stmt
        .query_map([like_pattern(query)], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(cnames)
}

fn alias_entries(conn: &Connection, sql: &str, arg: &str) -> StoreResult<Vec<AliasEntry>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let entries = stmt
        .query_map([arg], |row| {
            Ok(AliasEntry {
                target: row.get(0)?,
                cname: row.get(1)?,
                source_table: row.get(2)?,
                source_id: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

impl Catalog {
    /// Canonical name for `target`.
    ///
    /// Unknown names are their own canonical name, so an uncatalogued
    /// target never blocks an import. Storage errors are logged and
    /// treated the same way.
    pub fn cname(&self, target: &str) -> String {
        let conn = self.db.lock();
        match lookup_cname(&conn, target) {
            Ok(Some(cname)) => cname,
            Ok(None) => target.to_string(),
            Err(e) => {
                tracing::error!("cname lookup for {:?} failed: {}", target, e);
                target.to_string()
            }
        }
    }

    /// Whether `target` is a known alias spelling
    pub fn has_target(&self, target: &str) -> Result<bool, CatalogError> {
        let conn = self.db.lock();
        Ok(lookup_cname(&conn, target)?.is_some())
    }

    /// Canonical names matching a gallery search.
    ///
    /// Exact (case-sensitive) alias match on the query as given first;
    /// only if that finds nothing, a case-insensitive substring match.
    /// No query, or a blank one, matches everything.
    pub fn resolve_targets(&self, query: Option<&str>) -> Result<TargetMatch, CatalogError> {
        let query = match query {
            Some(q) if !q.trim().is_empty() => q,
            _ => return Ok(TargetMatch::All),
        };

        let conn = self.db.lock();
        let exact = exact_cnames(&conn, query)?;
        if !exact.is_empty() {
            return Ok(TargetMatch::Exact(exact));
        }
        let fuzzy = fuzzy_cnames(&conn, query)?;
        tracing::debug!("No exact target {:?}; {} fuzzy matches", query, fuzzy.len());
        Ok(TargetMatch::Fuzzy(fuzzy))
    }

    /// Alias rows for `term`, exact spelling first, substring otherwise
    pub fn aliases_matching(&self, term: &str) -> Result<Vec<AliasEntry>, CatalogError> {
        let conn = self.db.lock();
        let exact = alias_entries(
            &conn,
            "SELECT target, cname, table_name, table_id FROM catalog WHERE target = ?1",
            term,
        )?;
        if !exact.is_empty() {
            return Ok(exact);
        }
        Ok(alias_entries(
            &conn,
            "SELECT target, cname, table_name, table_id FROM catalog \
             WHERE target LIKE ?1 ESCAPE '\\' ORDER BY cname, target",
            &like_pattern(term),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::catalog::schema::ALIAS_INDEX;
    use crate::module::store::Database;

    fn catalog_with(entries: &[(&str, &str)]) -> Catalog {
        let db = Database::open_in_memory().unwrap();
        {
            let conn = db.lock();
            ALIAS_INDEX.create(&conn).unwrap();
            for (target, cname) in entries {
                conn.execute(
                    "INSERT INTO catalog (target, cname, table_name, table_id) \
                     VALUES (?1, ?2, 'sac_catalog', 1)",
                    [target, cname],
                )
                .unwrap();
            }
        }
        Catalog::new(db)
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("Orion"), "%Orion%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn test_cname_hit_and_miss() {
        let catalog = catalog_with(&[("M 1", "M 1"), ("NGC 1952", "M 1")]);
        assert_eq!(catalog.cname("NGC 1952"), "M 1");
        assert_eq!(catalog.cname("M 1"), "M 1");
        assert_eq!(catalog.cname("My Backyard Comet"), "My Backyard Comet");
        assert_eq!(catalog.cname(""), "");
        // Exact spelling only
        assert_eq!(catalog.cname("ngc 1952"), "ngc 1952");
    }

    #[test]
    fn test_cname_survives_missing_index() {
        let catalog = Catalog::new(Database::open_in_memory().unwrap());
        assert_eq!(catalog.cname("M 1"), "M 1");
        assert!(catalog.has_target("M 1").is_err());
    }

    #[test]
    fn test_has_target() {
        let catalog = catalog_with(&[("Vega", "Vega")]);
        assert!(catalog.has_target("Vega").unwrap());
        assert!(!catalog.has_target("vega").unwrap());
    }

    #[test]
    fn test_resolve_exact_before_fuzzy() {
        let catalog = catalog_with(&[
            ("Orion", "Orion Group"),
            ("Orion Nebula", "M 42"),
            ("M 42", "M 42"),
        ]);
        assert_eq!(
            catalog.resolve_targets(Some("Orion")).unwrap(),
            TargetMatch::Exact(vec!["Orion Group".to_string()])
        );

        let catalog = catalog_with(&[("Orion Nebula", "M 42"), ("M 42", "M 42")]);
        assert_eq!(
            catalog.resolve_targets(Some("Orion")).unwrap(),
            TargetMatch::Fuzzy(vec!["M 42".to_string()])
        );
    }

    #[test]
    fn test_resolve_fuzzy_is_case_insensitive_and_distinct() {
        let catalog = catalog_with(&[
            ("M 31", "M 31"),
            ("Andromeda Galaxy", "M 31"),
            ("NGC 224", "M 31"),
            ("Andromeda I", "Andromeda I"),
        ]);
        assert_eq!(
            catalog.resolve_targets(Some("andromeda")).unwrap(),
            TargetMatch::Fuzzy(vec!["Andromeda I".to_string(), "M 31".to_string()])
        );
    }

    #[test]
    fn test_resolve_empty_query_matches_all() {
        let catalog = catalog_with(&[]);
        assert_eq!(catalog.resolve_targets(None).unwrap(), TargetMatch::All);
        assert_eq!(catalog.resolve_targets(Some("  ")).unwrap(), TargetMatch::All);
        assert_eq!(
            catalog.resolve_targets(Some("Nothing")).unwrap(),
            TargetMatch::Fuzzy(vec![])
        );
    }

    #[test]
    fn test_wildcards_are_literal() {
        let catalog = catalog_with(&[("M 42", "M 42")]);
        assert!(catalog.resolve_targets(Some("%")).unwrap().is_empty());
        assert!(catalog.resolve_targets(Some("M_42")).unwrap().is_empty());
    }

    #[test]
    fn test_aliases_matching() {
        let catalog = catalog_with(&[
            ("M 1", "M 1"),
            ("NGC 1952", "M 1"),
            ("Crab Nebula", "M 1"),
        ]);
        let hits = catalog.aliases_matching("crab").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].cname, "M 1");
        assert_eq!(hits[0].source_table, "sac_catalog");

        let hits = catalog.aliases_matching("NGC 1952").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, "NGC 1952");
    }

    #[test]
    fn test_query_is_not_trimmed_for_exact_match() {
        let catalog = catalog_with(&[("Orion", "Orion Group"), ("Orion Nebula", "M 42")]);
        assert_eq!(
            catalog.resolve_targets(Some(" Orion")).unwrap(),
            TargetMatch::Fuzzy(vec![])
        );
        assert_eq!(
            catalog.resolve_targets(Some("Orion ")).unwrap(),
            TargetMatch::Fuzzy(vec!["M 42".to_string()])
        );
    }
}
