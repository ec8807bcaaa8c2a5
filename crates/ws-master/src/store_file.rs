//! File-backed settings store.

use std::path::PathBuf;

use ws_core::{MemoryStore, SettingsStore};
use ws_formats::{load_settings, save_settings};

/// Settings persisted as a flat key=value text file. Reads happen once at
/// open; writes are buffered until `flush`.
pub struct FileStore {
    path: PathBuf,
    entries: MemoryStore,
    dirty: bool,
}

impl FileStore {
    /// Open a store at `path`. A missing or unreadable file yields an empty
    /// store rather than an error — settings are always best-effort.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => load_settings(&text),
            Err(_) => MemoryStore::new(),
        };
        Self { path, entries, dirty: false }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SettingsStore for FileStore {
    fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.set(key, value);
        self.dirty = true;
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.dirty = true;
    }

    fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        if let Err(e) = std::fs::write(&self.path, save_settings(&self.entries)) {
            eprintln!("Failed to write settings {}: {}", self.path.display(), e);
            return;
        }
        self.dirty = false;
    }
}
