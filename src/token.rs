//! Access/refresh token persistence
//!
//! The token pair is the only durable client-side state. It is stored under a
//! single fixed key; consumers treat an absent or corrupt value as "not logged in".

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::ClientError;

/// Storage key holding the token pair
pub const AUTH_TOKEN: &str = "tip-wlan-auth-token";

/// Access and refresh token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Key-value wrapper around the persisted token pair
///
/// `set` must replace the pair in one step: a concurrent `get` sees either the
/// old pair or the new one.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<TokenPair>;

    fn set(&self, pair: &TokenPair) -> crate::Result<()>;

    fn remove(&self) -> crate::Result<()>;
}

/// In-process token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    pair: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            pair: RwLock::new(Some(pair)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<TokenPair> {
        self.pair
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, pair: &TokenPair) -> crate::Result<()> {
        *self.pair.write().unwrap_or_else(PoisonError::into_inner) = Some(pair.clone());
        Ok(())
    }

    fn remove(&self) -> crate::Result<()> {
        *self.pair.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Durable token store backed by a JSON key-value file
///
/// The file holds an object of storage keys to values, so it can be shared with
/// other local settings. Each write goes to its own temp file in the same
/// directory, which is then renamed over the original; writers from one store
/// are serialized so none of them drops another's keys.
///
/// All operations use blocking file I/O. The file is a few hundred bytes;
/// async callers that must not block use `tokio::task::spawn_blocking`, as
/// [`HttpTransport`](crate::transport::HttpTransport) does.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    key: String,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    /// Create a store using the default [`AUTH_TOKEN`] key
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_key(path, AUTH_TOKEN)
    }

    pub fn with_key(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> crate::Result<BTreeMap<String, serde_json::Value>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Entries to rewrite; only an undecodable file is replaced by an empty map
    fn entries_for_update(&self) -> crate::Result<BTreeMap<String, serde_json::Value>> {
        match self.read_entries() {
            Err(ClientError::Serialization(e)) => {
                warn!(path = %self.path.display(), error = %e, "replacing corrupt token storage");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, serde_json::Value>) -> crate::Result<()> {
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&serde_json::to_vec_pretty(entries)?)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<TokenPair> {
        let entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable token storage");
                return None;
            }
        };
        let value = entries.get(&self.key)?.clone();
        match serde_json::from_value(value) {
            Ok(pair) => Some(pair),
            Err(e) => {
                warn!(key = %self.key, error = %e, "corrupt token pair in storage");
                None
            }
        }
    }

    fn set(&self, pair: &TokenPair) -> crate::Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // A corrupt file is replaced rather than blocking login.
        let mut entries = self.entries_for_update()?;
        entries.insert(self.key.clone(), serde_json::to_value(pair)?);
        self.write_entries(&entries)
    }

    fn remove(&self) -> crate::Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.entries_for_update()?;
        if entries.remove(&self.key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemoryTokenStore::default();
        assert!(store.get().is_none());

        let pair = TokenPair::new("access", "refresh");
        store.set(&pair).unwrap();
        assert_eq!(store.get(), Some(pair));

        store.remove().unwrap();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let pair = TokenPair::new("a.b.c", "r-1");

        FileTokenStore::new(&path).set(&pair).unwrap();
        assert_eq!(FileTokenStore::new(&path).get(), Some(pair));

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[AUTH_TOKEN]["access_token"], "a.b.c");
        assert_eq!(raw[AUTH_TOKEN]["refresh_token"], "r-1");
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let store = FileTokenStore::new(&path);
        store.set(&TokenPair::new("a", "r")).unwrap();
        store.remove().unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert!(raw.get(AUTH_TOKEN).is_none());
    }

    #[test]
    fn test_corrupt_storage_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        fs::write(&path, "not json").unwrap();
        assert!(FileTokenStore::new(&path).get().is_none());

        fs::write(&path, format!(r#"{{"{AUTH_TOKEN}":{{"access_token":1}}}}"#)).unwrap();
        assert!(FileTokenStore::new(&path).get().is_none());
    }

    #[test]
    fn test_corrupt_storage_is_replaced_on_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        store.set(&TokenPair::new("a", "r")).unwrap();
        assert_eq!(store.get(), Some(TokenPair::new("a", "r")));
    }

    #[test]
    fn test_unreadable_storage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be cannot be read as storage.
        let store = FileTokenStore::new(dir.path());

        assert!(matches!(store.remove(), Err(ClientError::Storage(_))));
        assert!(matches!(
            store.set(&TokenPair::new("a", "r")),
            Err(ClientError::Storage(_))
        ));
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_concurrent_set_and_get_see_whole_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{"theme":"dark"}"#).unwrap();
        let store = FileTokenStore::new(&path);
        store.set(&TokenPair::new("seed", "r")).unwrap();

        std::thread::scope(|scope| {
            for writer in 0..4 {
                let store = &store;
                scope.spawn(move || {
                    for round in 0..200 {
                        let access = format!("{writer}-{round}-{}", "x".repeat(4096));
                        store.set(&TokenPair::new(access, "r")).unwrap();
                        let pair = store.get().expect("pair visible during concurrent writes");
                        assert_eq!(pair.refresh_token, "r");
                    }
                });
            }
        });

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_missing_file_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("absent.json"));
        assert!(store.get().is_none());
        store.remove().unwrap();
    }
}
