use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

use crate::background::capture::{OpenTab, TabSource};

#[derive(Debug, Deserialize)]
struct SessionDocument {
    tabs: Vec<OpenTab>,
}

/// Window session read from a JSON file: `{"tabs": [{"url", "title",
/// "faviconUrl"?, "pinned"?}, ...]}`, field names matching what browser
/// session exporters emit.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TabSource for SessionFile {
    fn open_tabs(&self) -> anyhow::Result<Vec<OpenTab>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading session file {}", self.path.display()))?;
        let doc: SessionDocument = serde_json::from_str(&raw)
            .with_context(|| format!("parsing session file {}", self.path.display()))?;
        Ok(doc.tabs)
    }
}
