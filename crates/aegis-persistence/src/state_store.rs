//! Atomic JSON snapshot store for small state blobs.

use crate::error::PersistenceResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Stores a single serializable value at a fixed path.
///
/// Saves go through a temp file followed by a rename, so a crash mid-save
/// leaves either the old snapshot or the new one, never a torn file.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    /// Persist a snapshot, replacing any previous one atomically.
    pub fn save<T: Serialize>(&self, state: &T) -> PersistenceResult<()> {
        let json = serde_json::to_string_pretty(state)?;

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), "Saved state snapshot");
        Ok(())
    }

    /// Load the last snapshot, if one exists and parses.
    ///
    /// A corrupt snapshot is treated as absent so startup can proceed
    /// with defaults instead of crashing.
    pub fn load<T: DeserializeOwned>(&self) -> PersistenceResult<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&json) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    ?e,
                    "Ignoring corrupt state snapshot"
                );
                Ok(None)
            }
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestState {
        generation: u32,
        active: bool,
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::new(temp_dir.path().join("state.json")).unwrap();

        let state = TestState {
            generation: 3,
            active: true,
        };
        store.save(&state).unwrap();

        let loaded: Option<TestState> = store.load().unwrap();
        assert_eq!(loaded, Some(state));
    }

    #[test]
    fn test_load_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::new(temp_dir.path().join("state.json")).unwrap();

        let loaded: Option<TestState> = store.load().unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_overwrites_previous() {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::new(temp_dir.path().join("state.json")).unwrap();

        store
            .save(&TestState {
                generation: 1,
                active: false,
            })
            .unwrap();
        store
            .save(&TestState {
                generation: 2,
                active: true,
            })
            .unwrap();

        let loaded: Option<TestState> = store.load().unwrap();
        assert_eq!(loaded.unwrap().generation, 2);
    }

    #[test]
    fn test_corrupt_snapshot_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = StateStore::new(&path).unwrap();
        let loaded: Option<TestState> = store.load().unwrap();
        assert!(loaded.is_none());
    }
}
