//! Shared key-value memory.
//!
//! The host reads "what is playing" from this memory. Two backends are
//! provided: [`InMemoryStore`] for a long-lived host process and
//! [`JsonFileMemory`] for hosts that re-run the controller per request and
//! still need the last published values.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use parking_lot::Mutex;

/// A string-to-string memory shared with the host.
///
/// Writes are best-effort from the controller's point of view: a failure is
/// logged by the caller and never fails a request.
pub trait MemoryStore: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> io::Result<()>;

    /// Reads the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local memory backed by a `DashMap`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: DashMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryStore for InMemoryStore {
    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|r| r.value().clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON file
// ─────────────────────────────────────────────────────────────────────────────

/// Memory persisted as a flat JSON object.
///
/// Every `save` is a locked load-modify-store cycle written through a temp
/// file and a rename, so a crash never leaves a truncated file behind.
pub struct JsonFileMemory {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileMemory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns an empty map if the file doesn't exist or is invalid.
    fn load(&self) -> BTreeMap<String, String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("[Memory] Ignoring unreadable {:?}: {}", self.path, e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        }
    }

    fn store(&self, values: &BTreeMap<String, String>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let temp_path = self.path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(values)?;
        std::fs::write(&temp_path, contents)?;
        std::fs::rename(&temp_path, &self.path)
    }
}

impl MemoryStore for JsonFileMemory {
    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        let _guard = self.lock.lock();
        let mut values = self.load();
        if values.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        values.insert(key.to_string(), value.to_string());
        self.store(&values)
    }

    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock();
        self.load().remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_overwrites() {
        let memory = InMemoryStore::new();
        assert!(memory.get("k").is_none());
        memory.save("k", "one").unwrap();
        memory.save("k", "two").unwrap();
        assert_eq!(memory.get("k").as_deref(), Some("two"));
    }

    #[test]
    fn json_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory.json");

        let memory = JsonFileMemory::new(&path);
        memory.save("current", "forest").unwrap();
        memory.save("volume", "-17").unwrap();

        let reopened = JsonFileMemory::new(&path);
        assert_eq!(reopened.get("current").as_deref(), Some("forest"));
        assert_eq!(reopened.get("volume").as_deref(), Some("-17"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn json_file_treats_garbage_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(&path, "not json").unwrap();

        let memory = JsonFileMemory::new(&path);
        assert!(memory.get("current").is_none());
        memory.save("current", "rain").unwrap();
        assert_eq!(memory.get("current").as_deref(), Some("rain"));
    }
}
