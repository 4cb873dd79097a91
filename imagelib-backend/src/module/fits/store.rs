//! The `fits` image table

use rusqlite::types::Value;
use rusqlite::{Connection, Row, named_params, params_from_iter};

use super::error::FitsError;
use super::types::{FitsRecord, FitsStatus, ImageType};
use crate::module::catalog::TargetMatch;
use crate::module::store::{Database, StoreError};

const CREATE_FITS: &str = "
    CREATE TABLE IF NOT EXISTS fits (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        target TEXT,
        object TEXT,
        date TEXT,
        timestamp TEXT,
        filter TEXT,
        binning TEXT,
        exposure REAL,
        x INTEGER,
        y INTEGER,
        path TEXT,
        preview TEXT,
        thumbnail TEXT,
        imagetype TEXT
    );
    CREATE UNIQUE INDEX IF NOT EXISTS fits_path_index ON fits (path);
    CREATE INDEX IF NOT EXISTS fits_date_name_index ON fits (date, target);
    CREATE INDEX IF NOT EXISTS fits_name_date_index ON fits (target, date);
";

const RECORD_COLUMNS: &str =
    "path, target, object, date, timestamp, filter, binning, exposure, x, y, preview, thumbnail, imagetype";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<FitsRecord> {
    let image_type: Option<String> = row.get(12)?;
    Ok(FitsRecord {
        path: row.get(0)?,
        target: row.get(1)?,
        object: row.get(2)?,
        date: row.get(3)?,
        timestamp: row.get(4)?,
        filter: row.get(5)?,
        binning: row.get(6)?,
        exposure: row.get(7)?,
        x: row.get(8)?,
        y: row.get(9)?,
        preview: row.get(10)?,
        thumbnail: row.get(11)?,
        image_type: image_type
            .as_deref()
            .and_then(ImageType::parse)
            .unwrap_or(ImageType::Target),
    })
}

fn grouped_counts(conn: &Connection, column: &str) -> Result<Vec<(String, usize)>, FitsError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {col}, count(*) FROM fits GROUP BY {col} ORDER BY 2 DESC, 1 ASC",
        col = column
    ))?;
    let counts = stmt
        .query_map([], |row| {
            let name: Option<String> = row.get(0)?;
            let n: i64 = row.get(1)?;
            Ok((name.unwrap_or_default(), n as usize))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(counts)
}

/// Image records, shared with the catalog through one [`Database`]
#[derive(Debug, Clone)]
pub struct FitsStore {
    db: Database,
}

impl FitsStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create the `fits` table and its indexes if missing
    pub fn create_schema(&self) -> Result<(), FitsError> {
        self.db.lock().execute_batch(CREATE_FITS)?;
        Ok(())
    }

    /// Insert one image. `Ok(false)` when its path is already in the library.
    pub fn insert(&self, record: &FitsRecord) -> Result<bool, FitsError> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "INSERT INTO fits ({}) VALUES (:path, :target, :object, :date, :timestamp, :filter, \
             :binning, :exposure, :x, :y, :preview, :thumbnail, :imagetype)",
            RECORD_COLUMNS
        ))?;
        let result = stmt.execute(named_params! {
            ":path": record.path,
            ":target": record.target,
            ":object": record.object,
            ":date": record.date,
            ":timestamp": record.timestamp,
            ":filter": record.filter,
            ":binning": record.binning,
            ":exposure": record.exposure,
            ":x": record.x,
            ":y": record.y,
            ":preview": record.preview,
            ":thumbnail": record.thumbnail,
            ":imagetype": record.image_type.as_str(),
        });
        match result {
            Ok(_) => Ok(true),
            Err(e) => match StoreError::from(e) {
                StoreError::UniqueViolation(_) => {
                    tracing::warn!("{} is already in the library; skipping", record.path);
                    Ok(false)
                }
                other => Err(other.into()),
            },
        }
    }

    pub fn status(&self) -> Result<FitsStatus, FitsError> {
        let conn = self.db.lock();
        let total: i64 = conn.query_row("SELECT count(*) FROM fits", [], |row| row.get(0))?;
        Ok(FitsStatus {
            total_images: total as usize,
            targets: grouped_counts(&conn, "target")?,
            dates: grouped_counts(&conn, "date")?,
        })
    }

    /// Images whose target is among `targets`, newest first
    pub fn find_images(
        &self,
        targets: &TargetMatch,
        limit: usize,
    ) -> Result<Vec<FitsRecord>, FitsError> {
        let mut args: Vec<Value> = Vec::new();
        let filter = match targets.targets() {
            None => String::new(),
            Some([]) => return Ok(Vec::new()),
            Some(names) => {
                args.extend(names.iter().map(|n| Value::Text(n.clone())));
                let marks: Vec<String> = (1..=names.len()).map(|n| format!("?{}", n)).collect();
                format!("WHERE target IN ({})", marks.join(", "))
            }
        };
        args.push(Value::Integer(limit as i64));

        let sql = format!(
            "SELECT {} FROM fits {} ORDER BY timestamp DESC, id DESC LIMIT ?{}",
            RECORD_COLUMNS,
            filter,
            args.len()
        );
        let conn = self.db.lock();
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(args), record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, target: &str, timestamp: &str) -> FitsRecord {
        FitsRecord {
            path: path.to_string(),
            target: target.to_string(),
            object: target.to_string(),
            date: timestamp[..10].to_string(),
            timestamp: timestamp.to_string(),
            filter: None,
            binning: Some("1x1".to_string()),
            exposure: Some(60.0),
            x: Some(1024),
            y: Some(768),
            preview: path.replace(".fits", ".png"),
            thumbnail: path.replace(".fits", "-thumb.png"),
            image_type: ImageType::Target,
        }
    }

    fn store() -> FitsStore {
        let store = FitsStore::new(Database::open_in_memory().unwrap());
        store.create_schema().unwrap();
        store
    }

    #[test]
    fn test_insert_and_duplicate_path() {
        let store = store();
        let r = record("a.fits", "M 42", "2023-05-20T05:41:18.042");
        assert!(store.insert(&r).unwrap());
        assert!(!store.insert(&r).unwrap());

        let found = store.find_images(&TargetMatch::All, 10).unwrap();
        assert_eq!(found, vec![r]);
    }

    #[test]
    fn test_create_schema_is_repeatable() {
        let store = store();
        store.create_schema().unwrap();
    }

    #[test]
    fn test_find_images_filters_and_orders() {
        let store = store();
        store.insert(&record("1.fits", "M 42", "2023-01-01T00:00:00")).unwrap();
        store.insert(&record("2.fits", "M 1", "2023-01-02T00:00:00")).unwrap();
        store.insert(&record("3.fits", "M 42", "2023-01-03T00:00:00")).unwrap();

        let paths = |found: Vec<FitsRecord>| found.into_iter().map(|r| r.path).collect::<Vec<_>>();

        let m42 = TargetMatch::Exact(vec!["M 42".to_string()]);
        assert_eq!(paths(store.find_images(&m42, 10).unwrap()), vec!["3.fits", "1.fits"]);
        assert_eq!(paths(store.find_images(&m42, 1).unwrap()), vec!["3.fits"]);

        let both = TargetMatch::Fuzzy(vec!["M 1".to_string(), "M 42".to_string()]);
        assert_eq!(store.find_images(&both, 10).unwrap().len(), 3);

        assert!(store.find_images(&TargetMatch::Fuzzy(vec![]), 10).unwrap().is_empty());
    }

    #[test]
    fn test_status_counts() {
        let store = store();
        store.insert(&record("1.fits", "M 42", "2023-01-01T00:00:00")).unwrap();
        store.insert(&record("2.fits", "M 42", "2023-01-01T01:00:00")).unwrap();
        store.insert(&record("3.fits", "M 1", "2023-01-02T00:00:00")).unwrap();

        let status = store.status().unwrap();
        assert_eq!(status.total_images, 3);
        assert_eq!(status.targets, vec![("M 42".to_string(), 2), ("M 1".to_string(), 1)]);
        assert_eq!(
            status.dates,
            vec![("2023-01-01".to_string(), 2), ("2023-01-02".to_string(), 1)]
        );
    }
}
