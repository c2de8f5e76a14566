use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::NoteError;
use crate::storage;

pub const DRAFTS_FILE_NAME: &str = "drafts.json";

/// Unsaved note text keyed by session key, mirrored to a JSON file so a
/// draft survives a crash or restart. Keys sort chronologically.
#[derive(Debug)]
pub struct DraftStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl DraftStore {
    /// Loads `path`; a missing or unreadable file starts an empty store.
    pub fn open(path: &Path) -> Self {
        let entries = match load_entries(path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "starting with empty draft store");
                BTreeMap::new()
            }
        };

        Self {
            path: Some(path.to_path_buf()),
            entries,
        }
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, key: &str, text: &str) -> Result<(), NoteError> {
        if self.entries.get(key).map(String::as_str) == Some(text) {
            return Ok(());
        }
        self.entries.insert(key.to_string(), text.to_string());
        self.persist()
    }

    pub fn remove(&mut self, key: &str) -> Result<bool, NoteError> {
        if self.entries.remove(key).is_none() {
            return Ok(false);
        }
        self.persist().map(|()| true)
    }

    /// The most recent draft: the greatest session-shaped key.
    pub fn latest(&self) -> Option<(&str, &str)> {
        self.entries
            .iter()
            .rev()
            .find(|(key, _)| key.contains('-'))
            .map(|(key, text)| (key.as_str(), text.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn persist(&self) -> Result<(), NoteError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(&self.entries)?;
        storage::write_atomic(path, &content)
    }
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, String>, NoteError> {
    match storage::read_optional(path)? {
        Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
        _ => Ok(BTreeMap::new()),
    }
}
