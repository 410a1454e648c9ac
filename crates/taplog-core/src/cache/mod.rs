//! Best-effort on-device snapshot of the log.
//!
//! The cache is an offline fallback only. Every failure is swallowed: a cache
//! that cannot be written or read behaves exactly like an empty one.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::models::LogEntry;

pub const CACHE_FILE_NAME: &str = "taplogger.cache.json";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Local storage unavailable: {0}")]
    Unavailable(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Raw storage capability behind the cache.
pub trait LocalPersistence: Send {
    fn save(&self, serialized: &str) -> CacheResult<()>;
    fn load(&self) -> CacheResult<Option<String>>;
}

/// Snapshot stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalPersistence for FileCache {
    fn save(&self, serialized: &str) -> CacheResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, serialized)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn load(&self) -> CacheResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}

/// Snapshot kept in memory; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryCache {
    /// Current raw snapshot, if one was saved.
    pub fn snapshot(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl LocalPersistence for MemoryCache {
    fn save(&self, serialized: &str) -> CacheResult<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|error| CacheError::Unavailable(error.to_string()))?;
        *slot = Some(serialized.to_string());
        Ok(())
    }

    fn load(&self) -> CacheResult<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|error| CacheError::Unavailable(error.to_string()))?;
        Ok(slot.clone())
    }
}

/// Storage that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCache;

impl LocalPersistence for DisabledCache {
    fn save(&self, _serialized: &str) -> CacheResult<()> {
        Err(CacheError::Unavailable("cache disabled".to_string()))
    }

    fn load(&self) -> CacheResult<Option<String>> {
        Err(CacheError::Unavailable("cache disabled".to_string()))
    }
}

/// Fail-soft serializer over a [`LocalPersistence`] backend.
pub struct LocalCache {
    backend: Box<dyn LocalPersistence>,
}

impl LocalCache {
    pub fn new(backend: impl LocalPersistence + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Persist a full snapshot, swallowing every error.
    pub fn persist(&self, entries: &[LogEntry]) {
        let serialized = match serde_json::to_string(entries) {
            Ok(serialized) => serialized,
            Err(error) => {
                tracing::debug!("Skipping cache write: {}", error);
                return;
            }
        };
        if let Err(error) = self.backend.save(&serialized) {
            tracing::debug!("Skipping cache write: {}", error);
        }
    }

    /// Read back the last snapshot. Any failure reads as "no cache".
    pub fn restore(&self) -> Option<Vec<LogEntry>> {
        let raw = match self.backend.load() {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::debug!("Local cache unavailable: {}", error);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Some(entries),
            Err(error) => {
                tracing::debug!("Ignoring unreadable local cache: {}", error);
                None
            }
        }
    }
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::new(MemoryCache::default())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{Category, LogEntry};

    fn sample_entries() -> Vec<LogEntry> {
        vec![
            LogEntry::tapped(Category::Eat, 2_000, Some("u".to_string())),
            LogEntry::tapped(Category::Feel, 1_000, Some("u".to_string())),
        ]
    }

    #[test]
    fn file_cache_roundtrips_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CACHE_FILE_NAME);
        let cache = LocalCache::new(FileCache::new(&path));
        let entries = sample_entries();

        cache.persist(&entries);
        assert!(path.exists());
        assert_eq!(cache.restore(), Some(entries));
    }

    #[test]
    fn missing_file_reads_as_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(FileCache::new(dir.path().join(CACHE_FILE_NAME)));
        assert_eq!(cache.restore(), None);
    }

    #[test]
    fn corrupt_snapshot_reads_as_no_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();

        let cache = LocalCache::new(FileCache::new(path));
        assert_eq!(cache.restore(), None);
    }

    #[test]
    fn disabled_backend_is_silent() {
        let cache = LocalCache::new(DisabledCache);
        cache.persist(&sample_entries());
        assert_eq!(cache.restore(), None);
    }

    #[test]
    fn memory_cache_clones_share_snapshot() {
        let backend = MemoryCache::default();
        let cache = LocalCache::new(backend.clone());
        cache.persist(&[]);
        assert_eq!(backend.snapshot().as_deref(), Some("[]"));
    }
}
