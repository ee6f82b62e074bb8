//! Persisted watchlist
//!
//! The watchlist is an insertion-ordered set of coin ids stored under a
//! single key as a JSON array of strings. Ids are free-form and need not
//! refer to a cached coin.

use crate::constants::DATA_DIR_NAME;
use crate::error::WatchlistError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Durable key/value storage for small string values
pub trait KeyValueStorage: Send + Sync {
    /// Returns the stored value, `None` if the key was never written
    fn load(&self, key: &str) -> Result<Option<String>, WatchlistError>;

    /// Replaces the stored value
    fn save(&self, key: &str, value: &str) -> Result<(), WatchlistError>;
}

/// Storage keeping one `<key>.json` file per key in a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage under the platform data directory, e.g.
    /// `~/.local/share/coin-tracker` on Linux
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|dir| Self::new(dir.join(DATA_DIR_NAME)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, WatchlistError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), WatchlistError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        // readers see either the old file or the new one
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Process-local storage, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, WatchlistError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), WatchlistError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Insertion-ordered set of coin ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watchlist {
    ids: Vec<String>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a watchlist from ids, keeping the first occurrence of each
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut watchlist = Self::new();
        for id in ids {
            watchlist.insert(id.into());
        }
        watchlist
    }

    /// Reads the persisted watchlist. A missing key yields an empty list.
    pub fn try_load(storage: &dyn KeyValueStorage, key: &str) -> Result<Self, WatchlistError> {
        let Some(raw) = storage.load(key)? else {
            return Ok(Self::new());
        };

        let ids: Vec<String> = serde_json::from_str(&raw)
            .map_err(|e| WatchlistError::PersistenceCorrupt(e.to_string()))?;
        Ok(Self::from_ids(ids))
    }

    /// Reads the persisted watchlist, starting empty when it is missing,
    /// unreadable or corrupt
    pub fn load(storage: &dyn KeyValueStorage, key: &str) -> Self {
        match Self::try_load(storage, key) {
            Ok(watchlist) => {
                tracing::debug!(count = watchlist.len(), "Loaded watchlist");
                watchlist
            }
            Err(e) => {
                tracing::warn!(error = %e, key, "Discarding persisted watchlist");
                Self::new()
            }
        }
    }

    /// Writes the full list under `key`
    pub fn persist(&self, storage: &dyn KeyValueStorage, key: &str) -> Result<(), WatchlistError> {
        let json = serde_json::to_string(&self.ids)?;
        storage.save(key, &json)
    }

    /// Appends `id` unless already present. Returns whether it was added.
    pub fn insert(&mut self, id: String) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Removes every occurrence of `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| existing != id);
        self.ids.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
