//! Data-point cache
//!
//! Responses of the data and statistics endpoints are stored under their
//! full request signature (`path?sorted-params`), so the same series read
//! with different windows or scaling is cached independently. Entries expire
//! lazily on read. A persistent store is a single JSON file: stale entries
//! are dropped when it is opened, and changes are written back through a
//! temporary file by [`DataCache::flush`] or when the cache is dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{store_path, CacheConfig};
use crate::error::{ClientError, Result};
use crate::transport::Params;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    stored_at: DateTime<Utc>,
    value: Value,
}

/// Hit/miss counters and current size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped because their lifetime ran out
    pub expired: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    hits: u64,
    misses: u64,
    expired: u64,
    /// Entries changed since the store was last written
    dirty: bool,
}

impl Inner {
    /// Drop entries older than `ttl`, returning how many went
    fn prune(&mut self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| is_fresh(entry, ttl, now));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.expired += removed as u64;
            self.dirty = true;
        }
        removed
    }
}

/// TTL cache of JSON responses keyed by request signature
#[derive(Debug)]
pub struct DataCache {
    inner: Mutex<Inner>,
    ttl: Duration,
    path: Option<PathBuf>,
}

impl DataCache {
    /// Cache living only as long as the process
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            ttl,
            path: None,
        }
    }

    /// Open (or create) a file-backed store
    ///
    /// An unreadable store is discarded with a warning rather than failing
    /// client construction.
    pub fn open(path: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Discarding unreadable cache store {}: {}", path.display(), e);
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        let mut inner = Inner {
            entries,
            ..Inner::default()
        };
        let stale = inner.prune(ttl, Utc::now());
        debug!(
            stale,
            "Opened cache store {} ({} entries)",
            path.display(),
            inner.entries.len()
        );

        Ok(Self {
            inner: Mutex::new(inner),
            ttl,
            path: Some(path),
        })
    }

    /// Build the cache described by `config`, `None` when disabled
    pub fn from_config(config: &CacheConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        if config.persist {
            Self::open(config.path(), config.ttl()).map(Some)
        } else {
            Ok(Some(Self::in_memory(config.ttl())))
        }
    }

    /// Request signature: path plus parameters sorted by name
    pub fn key(path: &str, params: &Params) -> String {
        let mut pairs: Vec<_> = params
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| format!("{}={}", k, v)))
            .collect();
        pairs.sort();
        let path = path.trim_matches('/');
        if pairs.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, pairs.join("&"))
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Utc::now())
    }

    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<Value> {
        let mut inner = self.inner.lock();
        let fresh = match inner.entries.get(key) {
            Some(entry) => is_fresh(entry, self.ttl, now),
            None => {
                inner.misses += 1;
                return None;
            }
        };

        if fresh {
            inner.hits += 1;
            return inner.entries.get(key).map(|e| e.value.clone());
        }

        debug!("Cache entry {} expired", key);
        inner.entries.remove(key);
        inner.expired += 1;
        inner.misses += 1;
        inner.dirty = true;
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.insert_at(key.into(), value, Utc::now());
    }

    fn insert_at(&self, key: String, value: Value, stored_at: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        inner.entries.insert(key, Entry { stored_at, value });
        inner.dirty = true;
    }

    /// Drop every entry whose key starts with `prefix`, returning the count
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|k, _| !k.starts_with(prefix));
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!("Invalidated {} cache entries under {}", removed, prefix);
            inner.dirty = true;
        }
        removed
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            expired: inner.expired,
            entries: inner.entries.len(),
        }
    }

    /// Write pending changes to the store, without its stale entries
    ///
    /// The file is written after the lock is released. A no-op for
    /// in-memory caches and when nothing changed.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = {
            let mut inner = self.inner.lock();
            if !inner.dirty {
                return Ok(());
            }
            inner.prune(self.ttl, Utc::now());
            let content = serde_json::to_vec(&inner.entries)?;
            inner.dirty = false;
            content
        };

        if let Err(e) = write_store(path, &content) {
            self.inner.lock().dirty = true;
            return Err(e);
        }
        debug!("Wrote cache store {}", path.display());
        Ok(())
    }
}

impl Drop for DataCache {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            let path = self.path.as_deref().unwrap_or(Path::new(""));
            warn!("Failed to persist cache store {}: {}", path.display(), e);
        }
    }
}

fn is_fresh(entry: &Entry, ttl: Duration, now: DateTime<Utc>) -> bool {
    match (now - entry.stored_at).to_std() {
        Ok(age) => age < ttl,
        // Stored in the future (clock skew): keep it
        Err(_) => true,
    }
}

fn write_store(path: &Path, content: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Remove the persisted store `name` in `dir` without opening a client
///
/// Returns whether a store existed.
pub fn clear_cache(dir: impl AsRef<Path>, name: &str) -> Result<bool> {
    let path = store_path(dir.as_ref(), name);
    match std::fs::remove_file(&path) {
        Ok(()) => {
            debug!("Removed cache store {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ClientError::Cache(format!(
            "failed to remove {}: {}",
            path.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&'static str, Option<&str>)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (*k, v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn test_key_is_order_independent() {
        let a = DataCache::key(
            "timeseries/3/data",
            &params(&[("start_time", Some("10")), ("end_time", Some("20"))]),
        );
        let b = DataCache::key(
            "/timeseries/3/data",
            &params(&[("end_time", Some("20")), ("scaling_length", None), ("start_time", Some("10"))]),
        );
        assert_eq!(a, b);
        assert_eq!(a, "timeseries/3/data?end_time=20&start_time=10");
        assert_eq!(DataCache::key("timeseries/3/data", &vec![]), "timeseries/3/data");

        let scaled = DataCache::key("timeseries/3/data", &params(&[("scaling_length", Some("50"))]));
        assert_ne!(scaled, DataCache::key("timeseries/3/data", &vec![]));
    }

    #[test]
    fn test_hit_miss_and_expiry() {
        let cache = DataCache::in_memory(Duration::from_secs(60));
        assert!(cache.get("a").is_none());

        cache.insert_at("a".into(), json!(1), Utc::now());
        cache.insert_at("b".into(), json!(2), Utc::now() - chrono::Duration::seconds(120));

        assert_eq!(cache.get("a"), Some(json!(1)));
        assert_eq!(cache.get("b"), None);

        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 2,
                expired: 1,
                entries: 1,
            }
        );
    }

    #[test]
    fn test_invalidate_prefix() {
        let cache = DataCache::in_memory(Duration::from_secs(60));
        cache.insert("timeseries/1/data", json!([]));
        cache.insert("timeseries/1/data?start_time=0", json!([]));
        cache.insert("timeseries/1/statistics", json!({}));
        cache.insert("timeseries/12/data", json!([]));

        assert_eq!(cache.invalidate_prefix("timeseries/1/"), 3);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("timeseries/12/data").is_some());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(dir.path(), "unit");

        {
            let cache = DataCache::open(&path, Duration::from_secs(60)).unwrap();
            cache.insert("timeseries/1/data", json!({"data": {"time": [0.0], "value": [1.0]}}));
        }

        let reopened = DataCache::open(&path, Duration::from_secs(60)).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(
            reopened.get("timeseries/1/data"),
            Some(json!({"data": {"time": [0.0], "value": [1.0]}}))
        );

        assert!(clear_cache(dir.path(), "unit").unwrap());
        assert!(!clear_cache(dir.path(), "unit").unwrap());
        assert_eq!(DataCache::open(&path, Duration::from_secs(60)).unwrap().len(), 0);
    }

    #[test]
    fn test_writes_are_deferred_until_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(dir.path(), "deferred");

        let cache = DataCache::open(&path, Duration::from_secs(60)).unwrap();
        cache.insert("timeseries/1/data", json!([1.0]));
        cache.insert("timeseries/2/data", json!([2.0]));
        assert!(!path.exists());

        cache.flush().unwrap();
        assert!(path.exists());
        assert_eq!(DataCache::open(&path, Duration::from_secs(60)).unwrap().len(), 2);
    }

    #[test]
    fn test_stale_entries_dropped_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(dir.path(), "stale");

        let entries = HashMap::from([(
            "timeseries/1/data?start_time=0".to_string(),
            Entry {
                stored_at: Utc::now() - chrono::Duration::seconds(120),
                value: json!([1.0]),
            },
        )]);
        write_store(&path, &serde_json::to_vec(&entries).unwrap()).unwrap();

        let cache = DataCache::open(&path, Duration::from_secs(60)).unwrap();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expired, 1);
    }

    #[test]
    fn test_flush_prunes_stale_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(dir.path(), "pruned");

        let cache = DataCache::open(&path, Duration::from_secs(60)).unwrap();
        cache.insert_at(
            "timeseries/1/data?start_time=5".into(),
            json!([1.0]),
            Utc::now() - chrono::Duration::seconds(120),
        );
        cache.insert("timeseries/1/data", json!([2.0]));
        cache.flush().unwrap();

        let stored: HashMap<String, Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored.contains_key("timeseries/1/data"));
    }

    #[test]
    fn test_corrupt_store_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(dir.path(), "broken");
        std::fs::write(&path, b"not json").unwrap();

        let cache = DataCache::open(&path, Duration::from_secs(60)).unwrap();
        assert!(cache.is_empty());
    }
}
