//! Shared SQLite connection
//!
//! One connection is opened per process and handed to every component
//! through a cloneable [`Database`] handle. All statements serialize
//! through the inner mutex.

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, ErrorCode, ffi};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Storage failures, split into the cases callers branch on.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A UNIQUE index rejected the row.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Anything else reported by SQLite.
    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, message)
                if e.code == ErrorCode::ConstraintViolation
                    && (e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                        || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY) =>
            {
                StoreError::UniqueViolation(message.clone().unwrap_or_else(|| e.to_string()))
            }
            _ => StoreError::Sqlite(err),
        }
    }
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle to the image library database
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        tracing::debug!("Opening database {}", path.display());
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Private in-memory database, used by tests and dry runs
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Lock the connection for the duration of the returned guard.
    ///
    /// Writers take `&mut` through the guard to open a transaction.
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Run `f` inside one transaction; commit only if it returns `Ok`.
    pub fn transaction<T, E>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(StoreError::from)?;
        let value = f(&tx)?;
        tx.commit().map_err(StoreError::from)?;
        Ok(value)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}
