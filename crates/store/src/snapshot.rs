//! JSON snapshots of whole aggregates
//!
//! One file per aggregate (`<name>.json`). Writes go to a temp file first and
//! are renamed into place, so a crash never leaves a half-written snapshot.

use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub struct SnapshotStore {
    base_path: PathBuf,
}

impl SnapshotStore {
    /// Open (and create if needed) a store rooted at `base_path`
    pub fn new(base_path: impl AsRef<Path>) -> StoreResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn path(&self, name: &str) -> StoreResult<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.base_path.join(format!("{}.json", name)))
    }

    pub fn exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.path(name)?.exists())
    }

    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> StoreResult<()> {
        let path = self.path(name)?;
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(value)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!(snapshot = name, path = %path.display(), "Snapshot saved");
        Ok(())
    }

    /// `None` if the snapshot was never saved
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> StoreResult<Option<T>> {
        let path = self.path(name)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        name: String,
        values: HashMap<String, u64>,
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();
        let counter = Counter {
            name: "cb".to_string(),
            values: HashMap::from([("a".to_string(), 1), ("b".to_string(), 2)]),
        };

        store.save("cb", &counter).unwrap();
        assert!(store.exists("cb").unwrap());
        assert_eq!(store.load::<Counter>("cb").unwrap(), Some(counter));
        assert!(!dir.path().join("cb.json.tmp").exists());
    }

    #[test]
    fn test_missing_snapshot_is_none() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested")).unwrap();
        assert_eq!(store.load::<Counter>("cbs").unwrap(), None);
    }

    #[test]
    fn test_rejects_path_like_names() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();
        assert!(matches!(
            store.path("../escape"),
            Err(StoreError::InvalidName(_))
        ));
        assert!(store.path("").is_err());
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();
        store.save("n", &1u64).unwrap();
        store.save("n", &2u64).unwrap();
        assert_eq!(store.load::<u64>("n").unwrap(), Some(2));
    }
}
