//! services/app/src/adapters/storage.rs
//!
//! File-backed implementation of the `ProfileStorage` port.
//!
//! The whole profile lives in a single JSON object (`profile.json` in the
//! data directory). Reads are served from an in-memory copy loaded at
//! construction; every mutation rewrites the file under the same lock, so
//! writes are synchronous and last-write-wins.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use doclens_core::ports::{PortError, PortResult, ProfileStorage};

const PROFILE_FILE: &str = "profile.json";

pub struct FileProfileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileProfileStorage {
    /// Opens (or creates) the profile store under `data_dir`.
    pub fn open(data_dir: &Path) -> PortResult<Self> {
        fs::create_dir_all(data_dir)
            .map_err(|e| PortError::Unexpected(format!("cannot create data dir: {e}")))?;
        let path = data_dir.join(PROFILE_FILE);

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("profile store at {} is corrupt, starting empty: {e}", path.display());
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn write_locked(&self, entries: &BTreeMap<String, String>) -> PortResult<()> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| PortError::Unexpected(format!("cannot encode profile: {e}")))?;
        fs::write(&self.path, raw)
            .map_err(|e| PortError::Unexpected(format!("cannot write profile: {e}")))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ProfileStorage for FileProfileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut entries = self.lock();
        entries.insert(key.to_string(), value.to_string());
        self.write_locked(&entries)
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        let mut entries = self.lock();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_locked(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_values_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = FileProfileStorage::open(dir.path()).unwrap();
            storage.set("token", "abc123").unwrap();
            storage.set("favorites", "[1,2]").unwrap();
        }

        let reopened = FileProfileStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.get("token").as_deref(), Some("abc123"));
        assert_eq!(reopened.get("favorites").as_deref(), Some("[1,2]"));
    }

    #[test]
    fn remove_deletes_durably() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileProfileStorage::open(dir.path()).unwrap();
        storage.set("token", "abc123").unwrap();
        storage.remove("token").unwrap();
        assert_eq!(storage.get("token"), None);

        let reopened = FileProfileStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.get("token"), None);
    }

    #[test]
    fn corrupt_profile_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PROFILE_FILE), "not json").unwrap();
        let storage = FileProfileStorage::open(dir.path()).unwrap();
        assert_eq!(storage.get("token"), None);
    }
}
