//! Key-value storage backends.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use super::error::StorageError;

/// Durable string-keyed storage.
///
/// Operations are synchronous: guards read the credential on every
/// transition and must not suspend to do so.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Storage persisted as a JSON object in a single file.
///
/// The file is read on first access and rewritten atomically (write to a
/// sibling temp file, then rename) on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    cache: Mutex<Option<BTreeMap<String, String>>>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::io(&self.path, e)),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let bytes = serde_json::to_vec_pretty(entries).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes).map_err(|e| StorageError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StorageError::io(&self.path, e))?;

        debug!(path = %self.path.display(), entries = entries.len(), "Storage file written");
        Ok(())
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> (T, bool),
    ) -> Result<T, StorageError> {
        let mut cache = self.cache.lock();
        if cache.is_none() {
            *cache = Some(self.load()?);
        }
        let Some(entries) = cache.as_mut() else {
            return Err(StorageError::Unavailable("storage cache not loaded".to_string()));
        };

        let (out, dirty) = f(entries);
        if dirty {
            self.persist(entries)?;
        }
        Ok(out)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_entries(|entries| (entries.get(key).cloned(), false))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_entries(|entries| {
            let changed = entries.get(key).map(String::as_str) != Some(value);
            entries.insert(key.to_string(), value.to_string());
            ((), changed)
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.with_entries(|entries| {
            let changed = entries.remove(key).is_some();
            ((), changed)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));

        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let first = FileStorage::new(&path);
        first.set("access_token", "abc").unwrap();
        first.set("theme", "dark").unwrap();

        let second = FileStorage::new(&path);
        assert_eq!(second.get("access_token").unwrap().as_deref(), Some("abc"));

        second.remove("access_token").unwrap();

        let third = FileStorage::new(&path);
        assert_eq!(third.get("access_token").unwrap(), None);
        assert_eq!(third.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_storage_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, b"not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get("access_token"),
            Err(StorageError::Corrupt { .. })
        ));
    }
}
