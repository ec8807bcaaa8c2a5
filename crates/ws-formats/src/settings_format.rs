//! Flat key=value settings text.
//!
//! One `key=value` per line. Blank lines and `#` comments are ignored, a
//! later duplicate key wins, and malformed lines are skipped rather than
//! rejected — a damaged settings file degrades to defaults, it never blocks
//! startup. Values keep everything after the first `=`, so track names with
//! spaces or `=` in keys' values survive a round trip.

use ws_core::{MemoryStore, SettingsStore};

/// Parse settings text into a store.
pub fn load_settings(text: &str) -> MemoryStore {
    let mut store = MemoryStore::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        store.set(key, value.trim());
    }
    store
}

/// Serialize a store back to settings text, keys in stable (sorted) order.
pub fn save_settings(store: &MemoryStore) -> String {
    let mut out = String::new();
    for (key, value) in store.iter() {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}
