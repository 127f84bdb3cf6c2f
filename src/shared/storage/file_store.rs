use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::shared::storage::key_value_store::{KeyValueStore, StoreError};

/// Directory-backed store: each key lives in `<dir>/<key>.json`.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates if needed) the cache directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| StoreError::Io {
            key: dir.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Io {
                key: key.to_string(),
                message: "key must be non-empty ASCII alphanumeric, '_' or '-'".to_string(),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn io_error(key: &str, err: std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| Self::io_error(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| Self::io_error(key, e))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_returns_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.set("profile", r#"{"fullName":"Ada"}"#).unwrap();

        assert_eq!(
            store.get("profile").unwrap().as_deref(),
            Some(r#"{"fullName":"Ada"}"#)
        );
    }

    #[test]
    fn values_survive_reopening_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.set("activePortfolioId", "501").unwrap();
        }

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("activePortfolioId").unwrap().as_deref(),
            Some("501")
        );
    }

    #[test]
    fn missing_key_is_none_and_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert!(store.get("skills").unwrap().is_none());
        store.remove("skills").unwrap();

        store.set("skills", "[]").unwrap();
        store.remove("skills").unwrap();
        assert!(!store.contains("skills").unwrap());
    }

    #[test]
    fn rejects_keys_that_could_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        let result = store.set("../outside", "x");

        assert!(matches!(result, Err(StoreError::Io { .. })));
    }
}
