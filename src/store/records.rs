use rusqlite::{params, OptionalExtension, Row};

use crate::models::TabRecord;
use crate::store::db::{Database, StoreError};

/// One bounded slice of the archive in descending last-visit order.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<TabRecord>,
    /// True iff at least one more record exists beyond this page.
    pub has_more: bool,
}

fn record_from_row(row: &Row<'_>) -> Result<TabRecord, rusqlite::Error> {
    Ok(TabRecord {
        url: row.get(0)?,
        title: row.get(1)?,
        favicon_url: row.get(2)?,
        count: row.get(3)?,
        last_visit: row.get(4)?,
    })
}

// Plain-connection helpers so the batch merge can run them inside its own
// transaction (a rusqlite Transaction derefs to Connection).
pub(crate) fn get_record(
    conn: &rusqlite::Connection,
    url: &str,
) -> Result<Option<TabRecord>, rusqlite::Error> {
    conn.query_row(
        "SELECT url, title, favicon_url, count, last_visit FROM tabs WHERE url = ?1",
        params![url],
        record_from_row,
    )
    .optional()
}

pub(crate) fn put_record(
    conn: &rusqlite::Connection,
    record: &TabRecord,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO tabs (url, title, favicon_url, count, last_visit)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(url) DO UPDATE SET
             title = excluded.title,
             favicon_url = excluded.favicon_url,
             count = excluded.count,
             last_visit = excluded.last_visit",
        params![
            record.url,
            record.title,
            record.favicon_url,
            record.count,
            record.last_visit
        ],
    )?;
    Ok(())
}

impl Database {
    pub fn get(&self, url: &str) -> Result<Option<TabRecord>, StoreError> {
        Ok(get_record(&self.conn, url)?)
    }

    /// Upsert by url.
    pub fn put(&self, record: &TabRecord) -> Result<(), StoreError> {
        Ok(put_record(&self.conn, record)?)
    }

    /// Removes the record if present; no-op otherwise.
    pub fn delete(&self, url: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM tabs WHERE url = ?1", params![url])?;
        Ok(())
    }

    /// Returns up to `limit` records after skipping `offset`, most recently
    /// visited first (ties broken by url). One extra row is fetched to decide
    /// `has_more`, so concurrent writes between pages never panic the scan.
    pub fn scan_by_last_visit_desc(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Page, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT url, title, favicon_url, count, last_visit FROM tabs
             ORDER BY last_visit DESC, url ASC
             LIMIT ?1 OFFSET ?2",
        )?;
        let mut items: Vec<TabRecord> = stmt
            .query_map(params![limit as i64 + 1, offset as i64], record_from_row)?
            .collect::<Result<_, _>>()?;

        let has_more = items.len() > limit;
        items.truncate(limit);
        Ok(Page { items, has_more })
    }
}
