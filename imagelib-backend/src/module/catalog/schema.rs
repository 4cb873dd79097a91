//! Static table descriptions for the catalog tables
//!
//! Every table the catalog owns is described once here. SQL text is
//! derived from these descriptions, and [`TableSchema::validate`] checks a
//! live database against them before any catalog data is read.

use rusqlite::Connection;

use super::error::CatalogError;
use crate::module::store::StoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    /// Text where the empty string is stored as NULL, so that UNIQUE
    /// indexes ignore it.
    OptionalText,
    Integer,
}

impl ColumnType {
    fn sql(&self) -> &'static str {
        match self {
            ColumnType::Text | ColumnType::OptionalText => "TEXT",
            ColumnType::Integer => "INTEGER",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

impl Column {
    pub const fn text(name: &'static str) -> Self {
        Self { name, ty: ColumnType::Text }
    }

    pub const fn optional_text(name: &'static str) -> Self {
        Self { name, ty: ColumnType::OptionalText }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self { name, ty: ColumnType::Integer }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Index {
    pub unique: bool,
    pub columns: &'static [&'static str],
}

impl Index {
    pub const fn unique(columns: &'static [&'static str]) -> Self {
        Self { unique: true, columns }
    }

    pub const fn plain(columns: &'static [&'static str]) -> Self {
        Self { unique: false, columns }
    }
}

#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    /// Prepend `id INTEGER PRIMARY KEY AUTOINCREMENT`
    pub row_id: bool,
    pub columns: &'static [Column],
    pub indices: &'static [Index],
}

pub static SAC_CATALOG: TableSchema = TableSchema {
    name: "sac_catalog",
    row_id: true,
    columns: &[
        Column::text("object"),
        Column::text("other"),
        Column::text("type"),
        Column::text("con"),
        Column::text("ra"),
        Column::text("dec"),
        Column::text("mag"),
        Column::text("subr"),
        Column::text("u2k"),
        Column::text("ti"),
        Column::text("size_max"),
        Column::text("size_min"),
        Column::text("pa"),
        Column::text("class"),
        Column::text("nsts"),
        Column::text("brstr"),
        Column::text("bchm"),
        Column::text("ngc_descr"),
        Column::text("notes"),
    ],
    indices: &[Index::unique(&["object"]), Index::plain(&["type"])],
};

pub static IAU_CATALOG: TableSchema = TableSchema {
    name: "iau_catalog",
    row_id: true,
    columns: &[
        Column::text("name"),
        Column::text("designation"),
        Column::optional_text("hip"),
        Column::optional_text("bayer"),
        Column::text("num"),
        Column::text("wds_j"),
        Column::text("mag"),
        Column::text("ra"),
        Column::text("dec"),
        Column::text("origin"),
        Column::text("note"),
        Column::text("source"),
        Column::text("unused"),
        Column::text("cid"),
        Column::text("con"),
    ],
    indices: &[
        Index::unique(&["name"]),
        Index::unique(&["hip"]),
        Index::unique(&["bayer"]),
    ],
};

/// The master alias index
pub static ALIAS_INDEX: TableSchema = TableSchema {
    name: "catalog",
    row_id: false,
    columns: &[
        Column::text("target"),
        Column::text("cname"),
        Column::text("table_name"),
        Column::integer("table_id"),
    ],
    indices: &[
        Index::plain(&["cname"]),
        Index::unique(&["target"]),
        Index::plain(&["table_name", "table_id"]),
    ],
};

/// Every catalog-owned table, in creation order
pub static ALL_TABLES: [&TableSchema; 3] = [&SAC_CATALOG, &IAU_CATALOG, &ALIAS_INDEX];

impl TableSchema {
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == column)
    }

    pub fn create_sql(&self) -> String {
        let mut defs: Vec<String> = Vec::with_capacity(self.columns.len() + 1);
        if self.row_id {
            defs.push("id INTEGER PRIMARY KEY AUTOINCREMENT".to_string());
        }
        defs.extend(self.columns.iter().map(|c| format!("{} {}", c.name, c.ty.sql())));
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            self.name,
            defs.join(",\n  ")
        )
    }

    pub fn index_sql(&self) -> Vec<String> {
        self.indices
            .iter()
            .enumerate()
            .map(|(n, index)| {
                format!(
                    "CREATE {}INDEX IF NOT EXISTS {}_index{} ON {} ({})",
                    if index.unique { "UNIQUE " } else { "" },
                    self.name,
                    n,
                    self.name,
                    index.columns.join(", ")
                )
            })
            .collect()
    }

    pub fn insert_sql(&self) -> String {
        let placeholders: Vec<String> = (1..=self.columns.len())
            .map(|n| format!("?{}", n))
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name,
            self.column_names().collect::<Vec<_>>().join(", "),
            placeholders.join(", ")
        )
    }

    /// `SELECT id, <columns> FROM <table> ORDER BY id`
    pub fn select_rows_sql(&self) -> String {
        format!(
            "SELECT id, {} FROM {} ORDER BY id",
            self.column_names().collect::<Vec<_>>().join(", "),
            self.name
        )
    }

    pub fn exists(&self, conn: &Connection) -> StoreResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [self.name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Create the table and its indexes. Returns `false` when the table
    /// was already there.
    pub fn create(&self, conn: &Connection) -> StoreResult<bool> {
        let existed = self.exists(conn)?;
        conn.execute(&self.create_sql(), [])?;
        for sql in self.index_sql() {
            conn.execute(&sql, [])?;
        }
        Ok(!existed)
    }

    /// Drop the table. Returns `false` when there was nothing to drop.
    pub fn drop_table(&self, conn: &Connection) -> StoreResult<bool> {
        let existed = self.exists(conn)?;
        conn.execute(&format!("DROP TABLE IF EXISTS {}", self.name), [])?;
        Ok(existed)
    }

    /// Compare the live column list with this description.
    pub fn validate(&self, conn: &Connection) -> Result<(), CatalogError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", self.name))?;
        let live: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<Result<_, _>>()?;

        let mut expected: Vec<(String, String)> = Vec::with_capacity(self.columns.len() + 1);
        if self.row_id {
            expected.push(("id".to_string(), "INTEGER".to_string()));
        }
        expected.extend(
            self.columns
                .iter()
                .map(|c| (c.name.to_string(), c.ty.sql().to_string())),
        );

        let live_upper: Vec<(String, String)> = live
            .into_iter()
            .map(|(name, ty)| (name, ty.to_uppercase()))
            .collect();

        if live_upper != expected {
            return Err(CatalogError::SchemaMismatch {
                table: self.name.to_string(),
                expected: expected.into_iter().map(|(name, _)| name).collect(),
                found: live_upper.into_iter().map(|(name, _)| name).collect(),
            });
        }
        Ok(())
    }
}
