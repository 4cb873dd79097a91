//! Canonical name resolution
//!
//! Builds the master alias index (`catalog` table) from the stored source
//! catalogs. Two passes over every row of every catalog:
//! 1. each row's canonical name is inserted as its own alias, so canonical
//!    names always win the UNIQUE(target) race;
//! 2. the remaining aliases are inserted, mapped to the same cname.
//!
//! A spelling that is already taken is a duplicate: logged, counted, skipped.
//! The caller owns the transaction.

use rusqlite::{Connection, params};

use super::alias::aliases_of;
use super::schema::ALIAS_INDEX;
use super::types::{BuildReport, CatalogKind, CatalogRow};
use crate::module::store::{StoreError, StoreResult};

/// One stored row with its alias list; `aliases[0]` is the cname
struct ResolvedRow {
    kind: CatalogKind,
    source_id: i64,
    aliases: Vec<String>,
}

/// Read every stored row of one catalog, in id order
pub fn stored_rows(conn: &Connection, kind: CatalogKind) -> StoreResult<Vec<CatalogRow>> {
    let schema = kind.format().schema;
    let width = schema.columns.len();
    let mut stmt = conn.prepare(&schema.select_rows_sql())?;
    let rows = stmt
        .query_map([], |row| {
            let source_id: i64 = row.get(0)?;
            let mut fields = Vec::with_capacity(width);
            for i in 1..=width {
                fields.push(row.get::<_, Option<String>>(i)?.unwrap_or_default());
            }
            Ok(CatalogRow {
                kind,
                source_id: Some(source_id),
                fields,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Insert one alias. `Ok(false)` means the spelling was already taken.
pub fn insert_alias(
    conn: &Connection,
    target: &str,
    cname: &str,
    kind: CatalogKind,
    source_id: i64,
) -> StoreResult<bool> {
    if target.is_empty() {
        return Ok(false);
    }
    let mut stmt = conn.prepare_cached(&ALIAS_INDEX.insert_sql())?;
    match stmt.execute(params![target, cname, kind.format().schema.name, source_id]) {
        Ok(_) => Ok(true),
        Err(e) => match StoreError::from(e) {
            StoreError::UniqueViolation(_) => {
                tracing::warn!(
                    "Duplicate canonical name for {} found [{}, {}, {}, {}]; skipping",
                    cname,
                    target,
                    cname,
                    kind.format().schema.name,
                    source_id
                );
                Ok(false)
            }
            other => Err(other),
        },
    }
}

/// Populate the alias index from the stored catalogs.
///
/// Aborts on the first storage error other than a duplicate; the
/// caller's transaction then rolls back everything.
pub fn build_index(conn: &Connection, report: &mut BuildReport) -> StoreResult<()> {
    tracing::info!("Building master catalog");

    let mut resolved: Vec<ResolvedRow> = Vec::new();
    for kind in CatalogKind::ALL {
        let rows = stored_rows(conn, kind)?;
        tracing::info!("Processing {} rows of {} catalog", rows.len(), kind);
        for row in rows {
            let aliases = aliases_of(&row);
            let Some(source_id) = row.source_id else {
                continue;
            };
            if aliases.is_empty() {
                continue;
            }
            resolved.push(ResolvedRow {
                kind,
                source_id,
                aliases,
            });
        }
    }

    // Pass 1: canonical names claim their spelling first
    for row in &resolved {
        let cname = &row.aliases[0];
        let stats = report.entry(row.kind);
        if insert_alias(conn, cname, cname, row.kind, row.source_id)? {
            stats.aliases_inserted += 1;
        } else {
            stats.duplicate_aliases += 1;
        }
    }

    // Pass 2: alternate names
    for row in &resolved {
        let cname = &row.aliases[0];
        for target in &row.aliases[1..] {
            let stats = report.entry(row.kind);
            if insert_alias(conn, target, cname, row.kind, row.source_id)? {
                stats.aliases_inserted += 1;
            } else {
                stats.duplicate_aliases += 1;
            }
        }
    }

    tracing::info!(
        "{} target aliases added ({} duplicates skipped)",
        report.alias_count(),
        report.duplicate_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::catalog::schema::{ALL_TABLES, IAU_CATALOG, SAC_CATALOG};

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for table in ALL_TABLES {
            table.create(&conn).unwrap();
        }
        conn
    }

    fn add_sac(conn: &Connection, object: &str, other: &str, ty: &str) {
        let mut values = vec![String::new(); SAC_CATALOG.columns.len()];
        values[0] = object.to_string();
        values[1] = other.to_string();
        values[2] = ty.to_string();
        conn.execute(&SAC_CATALOG.insert_sql(), rusqlite::params_from_iter(values))
            .unwrap();
    }

    fn add_iau(conn: &Connection, name: &str, designation: &str) {
        let mut values: Vec<Option<String>> = vec![Some(String::new()); IAU_CATALOG.columns.len()];
        values[0] = Some(name.to_string());
        values[1] = Some(designation.to_string());
        values[2] = None;
        values[3] = None;
        conn.execute(&IAU_CATALOG.insert_sql(), rusqlite::params_from_iter(values))
            .unwrap();
    }

    fn index(conn: &Connection) -> Vec<(String, String, String)> {
        let mut stmt = conn
            .prepare("SELECT target, cname, table_name FROM catalog ORDER BY rowid")
            .unwrap();
        stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_build_index_end_to_end() {
        let conn = setup();
        add_sac(&conn, "M1", "NGC 1952;Crab Nebula", "SNR");
        add_iau(&conn, "Vega", "HR 7001");

        let mut report = BuildReport::default();
        build_index(&conn, &mut report).unwrap();

        let rows = index(&conn);
        assert!(rows.contains(&("M1".into(), "M1".into(), "sac_catalog".into())));
        assert!(rows.contains(&("NGC 1952".into(), "M1".into(), "sac_catalog".into())));
        assert!(rows.contains(&("Crab Nebula".into(), "M1".into(), "sac_catalog".into())));
        assert!(rows.contains(&("Vega".into(), "Vega".into(), "iau_catalog".into())));
        assert!(rows.contains(&("HR 7001".into(), "Vega".into(), "iau_catalog".into())));
        assert_eq!(report.alias_count(), 5);
        assert_eq!(report.duplicate_count(), 0);
    }

    #[test]
    fn test_cnames_claimed_before_aliases() {
        let conn = setup();
        // The first row lists the second row's name as an alternate
        add_sac(&conn, "NGC 2070", "Tarantula Nebula;NGC 2060", "BRTNB");
        add_sac(&conn, "NGC 2060", "", "SNR");

        let mut report = BuildReport::default();
        build_index(&conn, &mut report).unwrap();

        let rows = index(&conn);
        assert!(rows.contains(&("NGC 2060".into(), "NGC 2060".into(), "sac_catalog".into())));
        assert_eq!(report.stats(CatalogKind::DeepSky).duplicate_aliases, 1);
    }

    #[test]
    fn test_placeholder_aliases_never_indexed() {
        let conn = setup();
        add_iau(&conn, "Sirius", "-12");
        let mut report = BuildReport::default();
        build_index(&conn, &mut report).unwrap();

        let targets: Vec<String> = index(&conn).into_iter().map(|r| r.0).collect();
        assert_eq!(targets, vec!["Sirius"]);
    }

    #[test]
    fn test_rebuild_without_drop_counts_duplicates() {
        let conn = setup();
        add_sac(&conn, "M 42", "NGC 1976;Orion Nebula", "BRTNB");

        let mut first = BuildReport::default();
        build_index(&conn, &mut first).unwrap();
        let before = index(&conn);

        let mut second = BuildReport::default();
        build_index(&conn, &mut second).unwrap();
        assert_eq!(second.alias_count(), 0);
        assert_eq!(second.duplicate_count(), 3);
        assert_eq!(index(&conn), before);
    }

    #[test]
    fn test_targets_unique_after_build() {
        let conn = setup();
        add_sac(&conn, "M 31", "NGC 224;Andromeda Galaxy", "GALXY");
        add_sac(&conn, "M 32", "NGC 221;Andromeda Galaxy", "GALXY");
        add_iau(&conn, "Andromeda Galaxy", "");

        let mut report = BuildReport::default();
        build_index(&conn, &mut report).unwrap();

        let dupes: i64 = conn
            .query_row(
                "SELECT count(*) FROM (SELECT target FROM catalog GROUP BY target HAVING count(*) > 1)",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(dupes, 0);

        // The IAU cname claims the spelling in pass 1, before either SAC alias
        let cname: String = conn
            .query_row(
                "SELECT cname FROM catalog WHERE target = 'Andromeda Galaxy'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(cname, "Andromeda Galaxy");
    }

    #[test]
    fn test_other_storage_errors_are_fatal() {
        let conn = Connection::open_in_memory().unwrap();
        // Source tables exist, alias index does not
        SAC_CATALOG.create(&conn).unwrap();
        IAU_CATALOG.create(&conn).unwrap();
        add_sac(&conn, "M 1", "", "SNR");

        let mut report = BuildReport::default();
        let err = build_index(&conn, &mut report).unwrap_err();
        assert!(!err.is_unique_violation());
    }
}
