//! JSON-file-backed [`ConfigStore`] with atomic tmp+rename writes.
//!
//! Every operation is a full read-modify-write of the state file, serialized
//! behind one mutex. Foreground edits (add/remove/configure) and background
//! status writes from an in-flight scan therefore never interleave.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::core::errors::{FsnError, Result};
use crate::store::{ConfigStore, PersistedState};

/// File-backed configuration store.
pub struct JsonStore {
    path: PathBuf,
    /// Guards the whole read-modify-write cycle, not just the file handle.
    lock: Mutex<()>,
}

impl JsonStore {
    /// Open a store at `path`. The file is created lazily on first write;
    /// a missing file reads as the empty default state.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_state(&self) -> Result<PersistedState> {
        if !self.path.exists() {
            return Ok(PersistedState::default());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|source| FsnError::store_io(&self.path, source))?;
        let state = serde_json::from_str(&raw)?;
        Ok(state)
    }

    /// Store state using atomic rename for crash safety.
    fn store_state(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| FsnError::store_io(parent, source))?;
        }

        let tmp_path = self.path.with_extension("tmp");
        let data = serde_json::to_vec_pretty(state)?;
        fs::write(&tmp_path, data).map_err(|source| FsnError::store_io(&tmp_path, source))?;
        fs::rename(&tmp_path, &self.path)
            .map_err(|source| FsnError::store_io(&self.path, source))?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&PersistedState) -> T) -> Result<T> {
        let _guard = self.lock.lock();
        let state = self.load_state()?;
        Ok(f(&state))
    }

    fn update(&self, f: impl FnOnce(&mut PersistedState) -> Result<()>) -> Result<()> {
        let _guard = self.lock.lock();
        let mut state = self.load_state()?;
        f(&mut state)?;
        self.store_state(&state)
    }
}

impl ConfigStore for JsonStore {
    fn folders(&self) -> Result<Vec<std::path::PathBuf>> {
        self.read(|state| state.folders.clone())
    }

    fn thresholds(&self) -> Result<std::collections::HashMap<PathBuf, u64>> {
        self.read(|state| state.thresholds.clone())
    }

    fn exceeded_status(&self) -> Result<std::collections::HashMap<PathBuf, bool>> {
        self.read(|state| state.exceeded.clone())
    }

    fn set_folders(&self, folders: &[PathBuf]) -> Result<()> {
        self.update(|state| {
            state.folders = folders.to_vec();
            Ok(())
        })
    }

    fn set_threshold(&self, path: &Path, mb: u64) -> Result<()> {
        self.update(|state| {
            state.thresholds.insert(path.to_path_buf(), mb.max(1));
            Ok(())
        })
    }

    fn set_exceeded(&self, path: &Path, exceeded: bool) -> Result<()> {
        self.update(|state| {
            state.exceeded.insert(path.to_path_buf(), exceeded);
            Ok(())
        })
    }

    fn add_folder(&self, path: &Path) -> Result<()> {
        self.update(|state| state.add_folder(path))
    }

    fn remove_folder(&self, path: &Path) -> Result<()> {
        self.update(|state| state.remove_folder(path))
    }

    fn last_notified(&self) -> Result<Option<NaiveDate>> {
        self.read(|state| state.last_notified)
    }

    fn set_last_notified(&self, date: NaiveDate) -> Result<()> {
        self.update(|state| {
            state.last_notified = Some(date);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DEFAULT_THRESHOLD_MB;

    fn temp_store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("state.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_dir, store) = temp_store();
        assert!(store.folders().unwrap().is_empty());
        assert!(store.last_notified().unwrap().is_none());
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        {
            let store = JsonStore::new(path.clone());
            store.add_folder(Path::new("/data/metadata")).unwrap();
            store.set_threshold(Path::new("/data/metadata"), 512).unwrap();
            store.set_exceeded(Path::new("/data/metadata"), true).unwrap();
        }

        let reopened = JsonStore::new(path);
        assert_eq!(
            reopened.folders().unwrap(),
            vec![PathBuf::from("/data/metadata")]
        );
        assert_eq!(
            reopened.threshold_mb(Path::new("/data/metadata")).unwrap(),
            512
        );
        assert!(reopened.was_exceeded(Path::new("/data/metadata")).unwrap());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("state.json");
        let store = JsonStore::new(path.clone());

        store.add_folder(Path::new("/data")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn remove_folder_is_atomic_on_disk() {
        let (_dir, store) = temp_store();
        let path = Path::new("/data/cache");

        store.add_folder(path).unwrap();
        store.set_exceeded(path, true).unwrap();
        store.remove_folder(path).unwrap();

        // Re-read straight from disk: no trace of the folder may remain.
        let raw = fs::read_to_string(store.path()).unwrap();
        let state: PersistedState = serde_json::from_str(&raw).unwrap();
        assert!(state.folders.is_empty());
        assert!(state.thresholds.is_empty());
        assert!(state.exceeded.is_empty());

        assert_eq!(store.threshold_mb(path).unwrap(), DEFAULT_THRESHOLD_MB);
        assert!(!store.was_exceeded(path).unwrap());
    }

    #[test]
    fn duplicate_add_leaves_file_unchanged() {
        let (_dir, store) = temp_store();
        store.add_folder(Path::new("/data")).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        assert!(store.add_folder(Path::new("/data")).is_err());
        let after = fs::read_to_string(store.path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn corrupt_state_file_reports_serialization_error() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "{ not json").unwrap();

        let err = store.folders().unwrap_err();
        assert_eq!(err.code(), "FSN-2101");
    }

    #[test]
    fn no_tmp_file_left_behind() {
        let (_dir, store) = temp_store();
        store.add_folder(Path::new("/data")).unwrap();
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn concurrent_writers_do_not_lose_updates() {
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::new(dir.path().join("state.json")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.add_folder(Path::new(&format!("/data/{i}"))).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.folders().unwrap().len(), 8);
    }
}
