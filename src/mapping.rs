//! Persisted key→action mapping table.
//!
//! [`MappingStore`] owns the table for the process lifetime. Mutations go
//! through [`add`](MappingStore::add) / [`remove`](MappingStore::remove) and
//! are **write-through**: the full table is re-serialized to disk before the
//! mutating call returns success. Keys are unique; insertion order is kept
//! only for display ([`entries`](MappingStore::entries)), lookups don't
//! depend on it.
//!
//! The on-disk shape is a flat JSON object (`{"K4": "play_track:t1", ...}`)
//! at a configurable path. A missing file is an empty table, not an error.
//!
//! All methods take `&self`; an interior lock makes each mutation atomic
//! with respect to concurrent lookups (the listener thread reads while a UI
//! thread edits). Saves overwrite the whole file; a crash mid-save can
//! leave either the pre- or post-mutation state on disk, which callers must
//! tolerate.

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::PersistError;

/// Owned key→action table with write-through JSON persistence.
pub struct MappingStore {
    path: PathBuf,
    table: Mutex<IndexMap<String, String>>,
}

impl MappingStore {
    /// Open the store backed by `path`, loading any existing table.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let path = path.into();
        let table = Self::read_table(&path)?;
        log::info!(
            "mapping store at {} loaded with {} entrie(s)",
            path.display(),
            table.len()
        );
        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    /// Upsert `key` → `action`, then save synchronously.
    ///
    /// On a save failure the in-memory upsert is kept (the edit is not
    /// lost) and the error is surfaced so the caller can warn and retry
    /// [`save`](MappingStore::save) explicitly.
    pub fn add(&self, key: &str, action: &str) -> Result<(), PersistError> {
        self.table
            .lock()
            .insert(key.to_string(), action.to_string());
        log::info!("mapping added: {key} -> {action}");
        self.save()
    }

    /// Remove `key`, then save synchronously.
    ///
    /// Returns `Ok(false)` when the key was absent; the table and the file
    /// are left untouched in that case.
    pub fn remove(&self, key: &str) -> Result<bool, PersistError> {
        let removed = self.table.lock().shift_remove(key).is_some();
        if !removed {
            log::debug!("no mapping found for key {key}");
            return Ok(false);
        }
        log::info!("mapping removed: {key}");
        self.save()?;
        Ok(true)
    }

    /// Pure read; no side effect.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.table.lock().get(key).cloned()
    }

    /// Display projection of the table, in insertion order.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.table
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Serialize the full current table, overwriting any prior file content.
    pub fn save(&self) -> Result<(), PersistError> {
        let json = {
            let table = self.table.lock();
            serde_json::to_string_pretty(&*table)
                .map_err(|e| PersistError::malformed(&self.path, e))?
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| PersistError::io(parent, e))?;
            }
        }
        fs::write(&self.path, json).map_err(|e| PersistError::io(&self.path, e))?;
        log::debug!("mappings saved to {}", self.path.display());
        Ok(())
    }

    /// Replace the in-memory table wholesale from the persisted file.
    pub fn reload(&self) -> Result<(), PersistError> {
        let loaded = Self::read_table(&self.path)?;
        *self.table.lock() = loaded;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(path: &Path) -> Result<IndexMap<String, String>, PersistError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                serde_json::from_str(&text).map_err(|e| PersistError::malformed(path, e))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("no mapping file at {}; starting empty", path.display());
                Ok(IndexMap::new())
            }
            Err(e) => Err(PersistError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> MappingStore {
        MappingStore::open(dir.path().join("mappings.json")).expect("open store")
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.is_empty());
    }

    #[test]
    fn lookup_reflects_net_effect_of_mutations() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);

        store.add("K4", "play_track:t1").unwrap();
        assert_eq!(store.lookup("K4").as_deref(), Some("play_track:t1"));

        // Upsert: last write wins, no duplicate key.
        store.add("K4", "play_track:t2").unwrap();
        assert_eq!(store.lookup("K4").as_deref(), Some("play_track:t2"));
        assert_eq!(store.len(), 1);

        assert!(store.remove("K4").unwrap());
        assert_eq!(store.lookup("K4"), None);
    }

    #[test]
    fn remove_of_absent_key_reports_absence() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.add("K1", "pause").unwrap();

        assert!(!store.remove("K9").unwrap());
        assert_eq!(
            store.entries(),
            vec![("K1".to_string(), "pause".to_string())]
        );
    }

    #[test]
    fn save_then_load_round_trips_the_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mappings.json");

        let store = MappingStore::open(&path).unwrap();
        store.add("K4", "play_track:t1").unwrap();
        store.add("K7", "stop_all").unwrap();
        store.add("K2", "pause").unwrap();

        let fresh = MappingStore::open(&path).unwrap();
        assert_eq!(fresh.entries(), store.entries());
    }

    #[test]
    fn every_mutation_is_written_through() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        let store = MappingStore::open(&path).unwrap();

        store.add("K4", "resume").unwrap();
        let on_disk: IndexMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.get("K4").map(String::as_str), Some("resume"));

        store.remove("K4").unwrap();
        let on_disk: IndexMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(on_disk.is_empty());
    }

    #[test]
    fn malformed_file_is_reported_not_swallowed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        fs::write(&path, "not json at all").unwrap();

        assert!(matches!(
            MappingStore::open(&path),
            Err(PersistError::Malformed { .. })
        ));
    }

    #[test]
    fn failed_save_keeps_the_in_memory_edit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blocked");
        let store = MappingStore::open(&path).unwrap();

        // Turn the target path into a directory so the write must fail.
        fs::create_dir(&path).unwrap();

        assert!(matches!(
            store.add("K4", "play_track:t1"),
            Err(PersistError::Io { .. })
        ));
        // Optimistic update survives so the caller can retry save().
        assert_eq!(store.lookup("K4").as_deref(), Some("play_track:t1"));
    }
}
