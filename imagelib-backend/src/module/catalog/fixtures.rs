//! Catalog text builders shared by the catalog tests

use super::loader::{FingerprintTable, fingerprint};
use super::schema::{IAU_CATALOG, SAC_CATALOG};
use super::types::CatalogKind;

pub const SAC_HEADER: &str = "\"OBJECT\",\"OTHER\",\"TYPE\",\"CON\",\"RA\",\"DEC\",\"MAG\",\"SUBR\",\"U2K\",\"TI\",\"SIZE_MAX\",\"SIZE_MIN\",\"PA\",\"CLASS\",\"NSTS\",\"BRSTR\",\"BCHM\",\"NGC DESCR\",\"NOTES\"\n";

pub const IAU_HEADER: &str = ",IAU Name ,Designation,HIP,Bayer Name,#,WDS_J,Vmag,RA(J2000),Dec(J2000),Origin,Etymology Note,Source,,ID,Const.\n";

/// A SAC data line with the given name and type columns; the rest empty
pub fn sac_line(object: &str, other: &str, ty: &str) -> String {
    sac_line_in(object, other, ty, "")
}

pub fn sac_line_in(object: &str, other: &str, ty: &str, con: &str) -> String {
    let mut cells = vec![
        format!("\"{}\"", object),
        format!("\"{}\"", other),
        format!("\"{}\"", ty),
        format!("\"{}\"", con),
    ];
    cells.extend(std::iter::repeat_n("\"\"".to_string(), SAC_CATALOG.columns.len() - 4));
    cells.join(",")
}

/// An IAU data line, leading null column included
pub fn iau_line(name: &str, designation: &str, hip: &str, bayer: &str, component: &str) -> String {
    let mut cells = vec!["", name, designation, hip, bayer, component];
    cells.extend(std::iter::repeat_n("", IAU_CATALOG.columns.len() - 5));
    cells.join(",")
}

/// Fingerprints that recognize the headers above
pub fn test_fingerprints() -> FingerprintTable {
    FingerprintTable::default()
        .with_override(CatalogKind::DeepSky, fingerprint(SAC_HEADER))
        .with_override(CatalogKind::NamedStar, fingerprint(IAU_HEADER))
}

fn catalog_file(header: &str, lines: &[String]) -> String {
    let mut content = header.to_string();
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    content
}

pub fn sac_file(lines: &[String]) -> String {
    catalog_file(SAC_HEADER, lines)
}

pub fn iau_file(lines: &[String]) -> String {
    catalog_file(IAU_HEADER, lines)
}
