use serde::{Deserialize, Serialize};

/// A persisted tab row. At most one record exists per url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabRecord {
    pub url: String,
    pub title: String,
    pub favicon_url: Option<String>,
    /// Visit count; starts at 1 and only grows under merges of the same url.
    pub count: i64,
    /// Unix millis of the most recent capture that touched this record.
    pub last_visit: i64,
}

/// A tab as observed at capture time, before it has been merged into the
/// store. `count` is the number of open duplicates this entry stands for
/// within its snapshot (1 for a raw per-tab observation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabObservation {
    pub url: String,
    pub title: String,
    pub favicon_url: Option<String>,
    pub count: i64,
    pub last_visit: i64,
}

impl TabObservation {
    pub fn new(url: impl Into<String>, title: impl Into<String>, last_visit: i64) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            favicon_url: None,
            count: 1,
            last_visit,
        }
    }
}

/// Collapses a raw capture sequence into one entry per url, preserving the
/// order of first appearance. Counts add up; display fields take the last
/// occurrence, matching the last-write-wins rule of the store merge.
pub fn dedup_by_url(observations: &[TabObservation]) -> Vec<TabObservation> {
    let mut out: Vec<TabObservation> = Vec::new();
    for obs in observations {
        if let Some(existing) = out.iter_mut().find(|o| o.url == obs.url) {
            existing.count += obs.count;
            existing.title = obs.title.clone();
            existing.favicon_url = obs.favicon_url.clone();
            existing.last_visit = obs.last_visit;
        } else {
            out.push(obs.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_collapses_duplicate_urls() {
        let observations = vec![
            TabObservation::new("https://a.example", "A", 10),
            TabObservation::new("https://b.example", "B", 10),
            TabObservation::new("https://a.example", "A2", 11),
        ];

        let deduped = dedup_by_url(&observations);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].url, "https://a.example");
        assert_eq!(deduped[0].count, 2);
        assert_eq!(deduped[0].title, "A2");
        assert_eq!(deduped[0].last_visit, 11);
        assert_eq!(deduped[1].url, "https://b.example");
        assert_eq!(deduped[1].count, 1);
    }

    #[test]
    fn dedup_keeps_first_appearance_order() {
        let observations = vec![
            TabObservation::new("https://c.example", "C", 1),
            TabObservation::new("https://a.example", "A", 1),
            TabObservation::new("https://c.example", "C", 2),
        ];

        let deduped = dedup_by_url(&observations);
        let urls: Vec<&str> = deduped.iter().map(|o| o.url.as_str()).collect();
        assert_eq!(urls, vec!["https://c.example", "https://a.example"]);
    }
}
