//! Persisted configuration store: monitored folders, per-folder thresholds,
//! last-known exceeded flags, and the last-notified date for daily dedup.
//!
//! The engine never touches persistence directly — it goes through the
//! [`ConfigStore`] trait. Two implementations are provided: a JSON-file-backed
//! store for the real application and an in-memory store for tests and
//! embedding.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{FsnError, Result};

pub mod json;

pub use json::JsonStore;

/// Threshold applied to folders with no configured threshold.
pub const DEFAULT_THRESHOLD_MB: u64 = 1000;

/// Abstract key-value store for monitored-folder configuration.
///
/// Implementations must make each operation atomic with respect to concurrent
/// callers: the foreground (add/remove/configure) and the background scan
/// worker (status updates) both go through this interface.
pub trait ConfigStore: Send + Sync {
    /// Monitored folders in insertion order.
    fn folders(&self) -> Result<Vec<PathBuf>>;

    /// Full path → threshold (MB) mapping. Unconfigured folders are absent.
    fn thresholds(&self) -> Result<HashMap<PathBuf, u64>>;

    /// Full path → last-known-exceeded mapping. Unconfigured folders are absent.
    fn exceeded_status(&self) -> Result<HashMap<PathBuf, bool>>;

    /// Replace the monitored folder list wholesale.
    fn set_folders(&self, folders: &[PathBuf]) -> Result<()>;

    /// Set one folder's threshold. Values below 1 MB are clamped to 1 —
    /// this is the configuration boundary the evaluator relies on.
    fn set_threshold(&self, path: &Path, mb: u64) -> Result<()>;

    /// Record one folder's last-known exceeded verdict.
    fn set_exceeded(&self, path: &Path, exceeded: bool) -> Result<()>;

    /// Register a new folder with the default threshold. Rejects duplicates.
    fn add_folder(&self, path: &Path) -> Result<()>;

    /// Remove a folder together with its threshold and exceeded-status
    /// entries, atomically. Unknown folders are an error.
    fn remove_folder(&self, path: &Path) -> Result<()>;

    /// Calendar date of the last threshold-exceeded notification, if any.
    fn last_notified(&self) -> Result<Option<NaiveDate>>;

    /// Record the date a threshold-exceeded notification was sent.
    fn set_last_notified(&self, date: NaiveDate) -> Result<()>;

    /// One folder's effective threshold, falling back to the default.
    fn threshold_mb(&self, path: &Path) -> Result<u64> {
        Ok(self
            .thresholds()?
            .get(path)
            .copied()
            .unwrap_or(DEFAULT_THRESHOLD_MB))
    }

    /// One folder's last-known exceeded flag, defaulting to false.
    fn was_exceeded(&self, path: &Path) -> Result<bool> {
        Ok(self
            .exceeded_status()?
            .get(path)
            .copied()
            .unwrap_or(false))
    }
}

// ──────────────────── persisted state model ────────────────────

/// The full persisted state: three logical key-value entries plus the
/// last-notified scalar, exactly what survives process restarts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PersistedState {
    /// Ordered list of monitored folder paths (insertion order).
    pub folders: Vec<PathBuf>,
    /// Path → threshold in megabytes.
    pub thresholds: HashMap<PathBuf, u64>,
    /// Path → last-known exceeded verdict.
    pub exceeded: HashMap<PathBuf, bool>,
    /// Date of the last threshold-exceeded notification (daily dedup).
    pub last_notified: Option<NaiveDate>,
}

impl PersistedState {
    fn add_folder(&mut self, path: &Path) -> Result<()> {
        if self.folders.iter().any(|f| f == path) {
            return Err(FsnError::DuplicateFolder {
                path: path.to_path_buf(),
            });
        }
        self.folders.push(path.to_path_buf());
        self.thresholds
            .insert(path.to_path_buf(), DEFAULT_THRESHOLD_MB);
        Ok(())
    }

    fn remove_folder(&mut self, path: &Path) -> Result<()> {
        let Some(index) = self.folders.iter().position(|f| f == path) else {
            return Err(FsnError::NotMonitored {
                path: path.to_path_buf(),
            });
        };
        self.folders.remove(index);
        self.thresholds.remove(path);
        self.exceeded.remove(path);
        Ok(())
    }
}

// ──────────────────── in-memory store ────────────────────

/// In-memory [`ConfigStore`] used by tests and library embedders.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<PersistedState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from an existing state (test fixtures).
    #[must_use]
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl ConfigStore for MemoryStore {
    fn folders(&self) -> Result<Vec<PathBuf>> {
        Ok(self.state.lock().folders.clone())
    }

    fn thresholds(&self) -> Result<HashMap<PathBuf, u64>> {
        Ok(self.state.lock().thresholds.clone())
    }

    fn exceeded_status(&self) -> Result<HashMap<PathBuf, bool>> {
        Ok(self.state.lock().exceeded.clone())
    }

    fn set_folders(&self, folders: &[PathBuf]) -> Result<()> {
        self.state.lock().folders = folders.to_vec();
        Ok(())
    }

    fn set_threshold(&self, path: &Path, mb: u64) -> Result<()> {
        self.state
            .lock()
            .thresholds
            .insert(path.to_path_buf(), mb.max(1));
        Ok(())
    }

    fn set_exceeded(&self, path: &Path, exceeded: bool) -> Result<()> {
        self.state
            .lock()
            .exceeded
            .insert(path.to_path_buf(), exceeded);
        Ok(())
    }

    fn add_folder(&self, path: &Path) -> Result<()> {
        self.state.lock().add_folder(path)
    }

    fn remove_folder(&self, path: &Path) -> Result<()> {
        self.state.lock().remove_folder(path)
    }

    fn last_notified(&self) -> Result<Option<NaiveDate>> {
        Ok(self.state.lock().last_notified)
    }

    fn set_last_notified(&self, date: NaiveDate) -> Result<()> {
        self.state.lock().last_notified = Some(date);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_folder_sets_default_threshold() {
        let store = MemoryStore::new();
        let path = Path::new("/data/metadata");

        store.add_folder(path).unwrap();

        assert_eq!(store.folders().unwrap(), vec![path.to_path_buf()]);
        assert_eq!(store.threshold_mb(path).unwrap(), DEFAULT_THRESHOLD_MB);
    }

    #[test]
    fn add_duplicate_folder_rejected() {
        let store = MemoryStore::new();
        let path = Path::new("/data/metadata");

        store.add_folder(path).unwrap();
        let err = store.add_folder(path).unwrap_err();
        assert_eq!(err.code(), "FSN-3003");
        assert_eq!(store.folders().unwrap().len(), 1);
    }

    #[test]
    fn folders_keep_insertion_order() {
        let store = MemoryStore::new();
        for name in ["/b", "/a", "/c"] {
            store.add_folder(Path::new(name)).unwrap();
        }
        assert_eq!(
            store.folders().unwrap(),
            vec![
                PathBuf::from("/b"),
                PathBuf::from("/a"),
                PathBuf::from("/c")
            ]
        );
    }

    #[test]
    fn set_threshold_clamps_to_one() {
        let store = MemoryStore::new();
        let path = Path::new("/data");
        store.add_folder(path).unwrap();

        store.set_threshold(path, 0).unwrap();
        assert_eq!(store.threshold_mb(path).unwrap(), 1);
    }

    #[test]
    fn unknown_folder_uses_defaults() {
        let store = MemoryStore::new();
        let path = Path::new("/never/added");

        assert_eq!(store.threshold_mb(path).unwrap(), DEFAULT_THRESHOLD_MB);
        assert!(!store.was_exceeded(path).unwrap());
    }

    #[test]
    fn remove_folder_drops_threshold_and_status() {
        let store = MemoryStore::new();
        let path = Path::new("/data/metadata");

        store.add_folder(path).unwrap();
        store.set_threshold(path, 250).unwrap();
        store.set_exceeded(path, true).unwrap();

        store.remove_folder(path).unwrap();

        assert!(store.folders().unwrap().is_empty());
        // Subsequent reads return the configured defaults, not stale values.
        assert_eq!(store.threshold_mb(path).unwrap(), DEFAULT_THRESHOLD_MB);
        assert!(!store.was_exceeded(path).unwrap());
    }

    #[test]
    fn remove_unknown_folder_is_error() {
        let store = MemoryStore::new();
        let err = store.remove_folder(Path::new("/nope")).unwrap_err();
        assert_eq!(err.code(), "FSN-3004");
    }

    #[test]
    fn last_notified_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.last_notified().unwrap().is_none());

        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        store.set_last_notified(date).unwrap();
        assert_eq!(store.last_notified().unwrap(), Some(date));
    }

    #[test]
    fn persisted_state_json_roundtrip() {
        let mut state = PersistedState::default();
        state.add_folder(Path::new("/data/a")).unwrap();
        state.exceeded.insert(PathBuf::from("/data/a"), true);
        state.last_notified = NaiveDate::from_ymd_opt(2025, 1, 2);

        let json = serde_json::to_string(&state).unwrap();
        let parsed: PersistedState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, parsed);
    }
}
