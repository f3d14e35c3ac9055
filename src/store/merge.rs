use rusqlite::Connection;
use tracing::debug;

use crate::models::{TabObservation, TabRecord};
use crate::store::db::{Database, StoreError};
use crate::store::records::{get_record, put_record};

/// Folds one observation into an existing record. Pure and total: display
/// fields are last-write-wins, the count grows by one per merge, a missing
/// record starts at count 1.
pub fn merge(existing: Option<&TabRecord>, observed: &TabObservation) -> TabRecord {
    match existing {
        None => TabRecord {
            url: observed.url.clone(),
            title: observed.title.clone(),
            favicon_url: observed.favicon_url.clone(),
            count: 1,
            last_visit: observed.last_visit,
        },
        Some(record) => TabRecord {
            url: record.url.clone(),
            title: observed.title.clone(),
            favicon_url: observed.favicon_url.clone(),
            count: record.count + 1,
            last_visit: observed.last_visit,
        },
    }
}

impl Database {
    /// Merges a batch of observations in batch order within one transaction.
    /// Duplicate urls in the batch are merged sequentially, not collapsed, so
    /// each open duplicate counts one visit. On a failed write the batch
    /// stops, writes applied so far are committed, and the failure is
    /// reported as [`StoreError::PartialMerge`].
    pub fn merge_batch(
        &mut self,
        observations: &[TabObservation],
    ) -> Result<usize, StoreError> {
        let total = observations.len();
        let tx = self.conn.transaction()?;

        let mut applied = 0;
        let mut failure: Option<rusqlite::Error> = None;
        for observed in observations {
            match merge_one(&tx, observed) {
                Ok(()) => applied += 1,
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        tx.commit()?;
        debug!(applied, total, "merged snapshot batch");

        match failure {
            None => Ok(applied),
            Some(source) => Err(StoreError::PartialMerge {
                applied,
                total,
                source,
            }),
        }
    }

    /// Merges a single observation, used by the archive-one path.
    pub fn merge_one(&self, observed: &TabObservation) -> Result<(), StoreError> {
        Ok(merge_one(&self.conn, observed)?)
    }
}

fn merge_one(conn: &Connection, observed: &TabObservation) -> Result<(), rusqlite::Error> {
    let existing = get_record(conn, &observed.url)?;
    let merged = merge(existing.as_ref(), observed);
    put_record(conn, &merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;

    fn observed(url: &str, title: &str, last_visit: i64) -> TabObservation {
        TabObservation::new(url, title, last_visit)
    }

    #[test]
    fn merge_of_absent_starts_at_one() {
        let result = merge(None, &observed("https://a.example", "A", 5));
        assert_eq!(result.count, 1);
        assert_eq!(result.title, "A");
        assert_eq!(result.last_visit, 5);
    }

    #[test]
    fn repeated_merges_count_each_visit_and_keep_last_fields() {
        let mut record = None;
        for i in 1..=4 {
            let obs = observed("https://a.example", &format!("title {i}"), i);
            record = Some(merge(record.as_ref(), &obs));
        }
        let record = record.unwrap();
        assert_eq!(record.count, 4);
        assert_eq!(record.title, "title 4");
        assert_eq!(record.last_visit, 4);
    }

    #[test]
    fn batch_with_duplicate_url_increments_twice() {
        let mut db = Database::in_memory().unwrap();
        let batch = vec![
            observed("https://a.example", "A", 10),
            observed("https://a.example", "A2", 11),
        ];
        let applied = db.merge_batch(&batch).unwrap();
        assert_eq!(applied, 2);

        let record = db.get("https://a.example").unwrap().unwrap();
        assert_eq!(record.count, 2);
        assert_eq!(record.title, "A2");
        assert_eq!(record.last_visit, 11);
    }

    #[test]
    fn batch_merge_increments_existing_records() {
        let mut db = Database::in_memory().unwrap();
        db.merge_batch(&[observed("https://a.example", "A", 1)]).unwrap();
        db.merge_batch(&[
            observed("https://a.example", "A fresh", 2),
            observed("https://b.example", "B", 2),
        ])
        .unwrap();

        let a = db.get("https://a.example").unwrap().unwrap();
        assert_eq!(a.count, 2);
        assert_eq!(a.title, "A fresh");
        let b = db.get("https://b.example").unwrap().unwrap();
        assert_eq!(b.count, 1);
    }

    #[test]
    fn merge_one_matches_batch_semantics() {
        let db = Database::in_memory().unwrap();
        db.merge_one(&observed("https://a.example", "A", 1)).unwrap();
        db.merge_one(&observed("https://a.example", "A2", 2)).unwrap();

        let record = db.get("https://a.example").unwrap().unwrap();
        assert_eq!(record.count, 2);
        assert_eq!(record.title, "A2");
    }
}
