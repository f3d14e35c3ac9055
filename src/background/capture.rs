use serde::Deserialize;

use crate::models::TabObservation;

/// A tab as reported by the window being captured.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTab {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub favicon_url: Option<String>,
    #[serde(default)]
    pub pinned: bool,
}

/// Source of the currently open tabs of one window.
pub trait TabSource {
    fn open_tabs(&self) -> anyhow::Result<Vec<OpenTab>>;
}

/// Builds the snapshot for one trigger: every non-pinned tab of the window,
/// in window order, one observation per open tab, stamped with the capture
/// time. Duplicate urls stay separate here; the store merge counts each of
/// them and the view collapses them for display.
pub fn capture_snapshot(
    source: &dyn TabSource,
    captured_at: i64,
) -> anyhow::Result<Vec<TabObservation>> {
    let tabs = source.open_tabs()?;
    Ok(tabs
        .into_iter()
        .filter(|tab| !tab.pinned)
        .map(|tab| TabObservation {
            url: tab.url,
            title: tab.title,
            favicon_url: tab.favicon_url,
            count: 1,
            last_visit: captured_at,
        })
        .collect())
}
