//! TTL cache store with durable persistence
//!
//! Generic key -> value store where every entry carries its own time-to-live.
//! Entries move through `Absent -> Valid -> Stale -> Absent`: a stale entry is
//! logically absent from [`CacheStore::get`] and is evicted lazily on
//! observation or by an explicit clear.
//!
//! The whole map is serialized to one JSON file on every mutation and
//! reloaded at construction, sweeping expired entries once. Write
//! amplification is accepted: mutations are cache-miss-driven and the map
//! holds tens of keys. A malformed persisted file is treated as an empty
//! cache, never as a fatal error.

use crate::types::{CacheMetadata, CacheStatus};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// One cached value with its freshness window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Payload, kept as JSON so the store stays generic over value types
    pub data: serde_json::Value,
    /// Unix milliseconds at the time of the write
    pub timestamp: i64,
    pub ttl_secs: u64,
}

impl CacheEntry {
    fn is_valid(&self, now_ms: i64) -> bool {
        (now_ms - self.timestamp) < (self.ttl_secs as i64) * 1000
    }

    fn age_secs(&self, now_ms: i64) -> u64 {
        ((now_ms - self.timestamp).max(0) / 1000) as u64
    }
}

/// Persistent TTL cache, constructed once per process and shared by reference
pub struct CacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    path: PathBuf,
}

impl CacheStore {
    /// Open the store backed by the given file, loading surviving entries
    ///
    /// Expired entries are swept once during load. Corruption downgrades to
    /// an empty cache with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut entries = Self::load(&path);

        let now_ms = Utc::now().timestamp_millis();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid(now_ms));
        let swept = before - entries.len();
        if swept > 0 {
            tracing::debug!(swept, remaining = entries.len(), "swept expired cache entries at load");
        }

        let store = Self {
            entries: RwLock::new(entries),
            path,
        };
        if swept > 0 {
            store.persist();
        }
        store
    }

    fn load(path: &Path) -> HashMap<String, CacheEntry> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return HashMap::new(),
        };

        match serde_json::from_str::<Vec<(String, CacheEntry)>>(&raw) {
            Ok(pairs) => pairs.into_iter().collect(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "persisted cache is corrupt, starting empty");
                HashMap::new()
            }
        }
    }

    /// Store a value, overwriting any previous entry and resetting its clock
    pub fn set<T: Serialize>(&self, key: &str, data: &T, ttl_secs: u64) {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to serialize cache value, dropping write");
                return;
            }
        };

        {
            let mut entries = self.entries.write().unwrap();
            entries.insert(
                key.to_string(),
                CacheEntry {
                    data: value,
                    timestamp: Utc::now().timestamp_millis(),
                    ttl_secs,
                },
            );
        }
        self.persist();
    }

    /// Retrieve a valid entry, or `None` for absent/stale keys
    ///
    /// A stale entry reads as absent but its raw form stays in storage
    /// until the next load sweep or explicit clear, so the serve-stale
    /// path can still reach it.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now_ms = Utc::now().timestamp_millis();
        let entries = self.entries.read().unwrap();
        match entries.get(key) {
            Some(entry) if entry.is_valid(now_ms) => {
                serde_json::from_value(entry.data.clone()).ok()
            }
            _ => None,
        }
    }

    /// Retrieve an entry regardless of validity (serve-stale-on-error path)
    pub fn get_ignoring_validity<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().unwrap();
        entries
            .get(key)
            .and_then(|entry| serde_json::from_value(entry.data.clone()).ok())
    }

    /// Whether the entry exists and is inside its TTL window
    pub fn is_valid(&self, key: &str) -> bool {
        let now_ms = Utc::now().timestamp_millis();
        let entries = self.entries.read().unwrap();
        entries.get(key).is_some_and(|e| e.is_valid(now_ms))
    }

    /// Age of the entry in seconds; 0 for absent keys
    pub fn age_secs(&self, key: &str) -> u64 {
        let now_ms = Utc::now().timestamp_millis();
        let entries = self.entries.read().unwrap();
        entries.get(key).map_or(0, |e| e.age_secs(now_ms))
    }

    /// Remove one entry
    pub fn clear(&self, key: &str) {
        let removed = self.entries.write().unwrap().remove(key).is_some();
        if removed {
            self.persist();
        }
    }

    /// Remove every entry
    pub fn clear_all(&self) {
        self.entries.write().unwrap().clear();
        self.persist();
    }

    /// Snapshot of all keys currently held (valid or stale)
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().unwrap().keys().cloned().collect()
    }

    /// Introspection data for one entry
    pub fn metadata(&self, key: &str) -> Option<CacheMetadata> {
        let now_ms = Utc::now().timestamp_millis();
        let entries = self.entries.read().unwrap();
        entries.get(key).map(|entry| CacheMetadata {
            key: key.to_string(),
            timestamp: entry.timestamp,
            ttl_secs: entry.ttl_secs,
            age_secs: entry.age_secs(now_ms),
            is_valid: entry.is_valid(now_ms),
        })
    }

    /// Operational snapshot: entry count, size estimate, oldest/newest entry
    pub fn status(&self) -> CacheStatus {
        let now_ms = Utc::now().timestamp_millis();
        let entries = self.entries.read().unwrap();

        let metadata = |key: &String, entry: &CacheEntry| CacheMetadata {
            key: key.clone(),
            timestamp: entry.timestamp,
            ttl_secs: entry.ttl_secs,
            age_secs: entry.age_secs(now_ms),
            is_valid: entry.is_valid(now_ms),
        };

        let oldest = entries
            .iter()
            .min_by_key(|(_, e)| e.timestamp)
            .map(|(k, e)| metadata(k, e));
        let newest = entries
            .iter()
            .max_by_key(|(_, e)| e.timestamp)
            .map(|(k, e)| metadata(k, e));

        let total_size = serde_json::to_string(&entries.iter().collect::<Vec<_>>())
            .map(|s| s.len())
            .unwrap_or(0);

        CacheStatus {
            entries: entries.len(),
            total_size,
            oldest_entry: oldest,
            newest_entry: newest,
        }
    }

    /// Serialize the whole map to disk
    ///
    /// Best-effort: a failed write is logged and the in-memory state stands,
    /// since the source of truth is always the upstream provider.
    fn persist(&self) {
        let serialized = {
            let entries = self.entries.read().unwrap();
            let pairs: Vec<(&String, &CacheEntry)> = entries.iter().collect();
            match serde_json::to_string(&pairs) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to serialize cache");
                    return;
                }
            }
        };

        let tmp = self.path.with_extension("tmp");
        let result = std::fs::write(&tmp, serialized).and_then(|_| std::fs::rename(&tmp, &self.path));
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to persist cache");
        }
    }

    /// Shift an entry's timestamp into the past so TTL laws are testable
    /// without sleeping
    #[cfg(test)]
    pub fn backdate(&self, key: &str, secs: u64) {
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            entry.timestamp -= (secs as i64) * 1000;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (CacheStore, PathBuf) {
        let path = std::env::temp_dir().join(format!("mandi-cache-{}.json", uuid::Uuid::new_v4()));
        (CacheStore::open(&path), path)
    }

    #[test]
    fn set_then_get_roundtrips_and_is_valid() {
        let (store, path) = temp_store();
        store.set("k", &vec![1u32, 2, 3], 60);

        assert_eq!(store.get::<Vec<u32>>("k"), Some(vec![1, 2, 3]));
        assert!(store.is_valid("k"));
        assert_eq!(store.age_secs("k"), 0);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn expired_entry_reads_as_absent() {
        let (store, path) = temp_store();
        store.set("k", &"data", 10);
        store.backdate("k", 11);

        assert!(!store.is_valid("k"));
        assert_eq!(store.get::<String>("k"), None);
        // the raw entry survives until swept or cleared
        assert_eq!(store.keys(), vec!["k".to_string()]);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn stale_entry_still_readable_ignoring_validity() {
        let (store, path) = temp_store();
        store.set("k", &42u64, 10);
        store.backdate("k", 20);

        assert!(!store.is_valid("k"));
        assert_eq!(store.get_ignoring_validity::<u64>("k"), Some(42));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn reload_keeps_valid_entries_and_sweeps_expired() {
        let (store, path) = temp_store();
        store.set("fresh", &"alive", 3600);
        store.set("old", &"dead", 10);
        store.backdate("old", 60);
        // backdate only touches memory; persist the backdated state
        store.set("fresh", &"alive", 3600);

        let reloaded = CacheStore::open(&path);
        assert_eq!(reloaded.get::<String>("fresh"), Some("alive".to_string()));
        assert!(reloaded.keys() == vec!["fresh".to_string()]);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let path = std::env::temp_dir().join(format!("mandi-cache-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "{not json at all").unwrap();

        let store = CacheStore::open(&path);
        assert!(store.keys().is_empty());
        assert_eq!(store.status().entries, 0);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn clear_and_clear_all_evict() {
        let (store, path) = temp_store();
        store.set("a", &1u8, 60);
        store.set("b", &2u8, 60);

        store.clear("a");
        assert_eq!(store.get::<u8>("a"), None);
        assert_eq!(store.get::<u8>("b"), Some(2));

        store.clear_all();
        assert!(store.keys().is_empty());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn status_reports_oldest_and_newest() {
        let (store, path) = temp_store();
        store.set("old", &1u8, 600);
        store.backdate("old", 100);
        store.set("new", &2u8, 600);

        let status = store.status();
        assert_eq!(status.entries, 2);
        assert!(status.total_size > 0);
        assert_eq!(status.oldest_entry.unwrap().key, "old");
        assert_eq!(status.newest_entry.unwrap().key, "new");

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn metadata_tracks_validity() {
        let (store, path) = temp_store();
        store.set("k", &"v", 30);

        let meta = store.metadata("k").unwrap();
        assert!(meta.is_valid);
        assert_eq!(meta.ttl_secs, 30);

        store.backdate("k", 31);
        assert!(!store.metadata("k").unwrap().is_valid);
        assert!(store.metadata("missing").is_none());

        let _ = std::fs::remove_file(path);
    }
}
