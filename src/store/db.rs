use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;
use tracing::info;

/// Schema version stored in `PRAGMA user_version`. v1 lacked `favicon_url`;
/// v2 added it. Upgrading re-declares the indexes and applies one additive
/// ALTER TABLE, no data transformation.
const SCHEMA_VERSION: i64 = 2;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database could not be opened or initialized.
    #[error("archive store unavailable: {0}")]
    Unavailable(#[source] rusqlite::Error),

    /// A merge batch failed midway. Writes applied before the failure stand.
    #[error("merge batch failed after {applied} of {total} writes: {source}")]
    PartialMerge {
        applied: usize,
        total: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Connection to the tab archive. One collection of records keyed by url,
/// with secondary indexes by last visit and by title.
pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    /// Opens (and initializes if needed) the archive at `path`. Idempotent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(StoreError::Unavailable)?;
        let mut db = Self { conn };
        db.init_schema().map_err(StoreError::Unavailable)?;
        Ok(db)
    }

    /// In-memory archive, used by tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Unavailable)?;
        let mut db = Self { conn };
        db.init_schema().map_err(StoreError::Unavailable)?;
        Ok(db)
    }

    fn init_schema(&mut self) -> Result<(), rusqlite::Error> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == 1 {
            // v1 predates favicons.
            self.conn
                .execute("ALTER TABLE tabs ADD COLUMN favicon_url TEXT", [])?;
            info!("upgraded tab archive schema from v1 to v{SCHEMA_VERSION}");
        }

        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tabs (
                url TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                favicon_url TEXT,
                count INTEGER NOT NULL DEFAULT 1,
                last_visit INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tabs_last_visit ON tabs(last_visit DESC, url ASC);
            CREATE INDEX IF NOT EXISTS idx_tabs_title ON tabs(title);
            "#,
        )?;

        if version != SCHEMA_VERSION {
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(())
    }
}
