//! Keyed, TTL-expiring result cache
//!
//! Used to avoid redundant refetch/recomputation within a time window. The
//! cache is an explicit object with lifecycle owned by the caller — there is
//! no process-wide singleton. Entries live in an in-memory map, optionally
//! mirrored to a directory of per-entry JSON files so a short-lived process
//! can reuse a previous run's results.
//!
//! Storage identifiers are the hex SHA-256 of the logical key string, which
//! keeps them bounded and filesystem-safe regardless of key content.
//!
//! Failure semantics: any failure to read or persist an entry degrades to a
//! cache miss (logged, never propagated). Caching must never cause a fetch
//! to fail outright. Concurrent callers racing on the same key may both miss
//! and both refetch; entries are idempotent recomputations, so this is
//! harmless.

use crate::config::{CacheConfig, Config};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// One cache entry: an opaque serialized payload plus its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Serialized payload (an activity sequence or a summary)
    pub value: serde_json::Value,
    /// When the entry was stored
    pub created: DateTime<Utc>,
    /// When the entry expires; absent means no expiry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|e| e <= now)
    }
}

/// Keyed TTL cache with lazy expiry eviction.
pub struct Cache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    dir: Option<PathBuf>,
    default_ttl: Option<Duration>,
    enabled: bool,
}

impl Cache {
    /// Create an in-memory cache with no disk mirror and no default TTL.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            dir: None,
            default_ttl: None,
            enabled: true,
        }
    }

    /// Build a cache from the `[cache]` config section.
    ///
    /// An enabled cache mirrors to the configured directory (the XDG cache
    /// dir when unset) with `ttl_secs` as its default TTL. A disabled cache
    /// stores and serves nothing, so callers need no separate code path.
    pub fn from_config(config: &CacheConfig) -> Self {
        if !config.enabled {
            return Self {
                enabled: false,
                ..Self::new()
            };
        }

        let dir = config.dir.clone().unwrap_or_else(Config::cache_dir);
        Self::new()
            .with_dir(dir)
            .with_default_ttl(Duration::from_secs(config.ttl_secs))
    }

    /// Mirror entries to a directory of JSON files.
    ///
    /// The directory is created lazily on first write.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// TTL applied by [`Cache::set`] when the caller passes none.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Fetch a value. Returns `None` when absent or expired; an expired
    /// entry found on the read path is evicted.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.get_at(key, Utc::now())
    }

    /// Fetch and deserialize a value.
    ///
    /// A stored value that no longer deserializes (schema drift) degrades
    /// to a miss.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                tracing::warn!(key, error = %e, "Cached value failed to deserialize, treating as miss");
                self.delete(key);
                None
            }
        }
    }

    /// Store a value with an optional TTL (falls back to the default TTL).
    ///
    /// Serialization or disk failures are logged and swallowed; the caller
    /// never fails because of the cache.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        if !self.enabled {
            return;
        }

        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to serialize cache value, skipping store");
                return;
            }
        };

        let now = Utc::now();
        let ttl = ttl.or(self.default_ttl);
        let expiry = ttl.and_then(|ttl| chrono::Duration::from_std(ttl).ok().map(|d| now + d));

        let entry = CacheEntry {
            value,
            created: now,
            expiry,
        };

        if let Some(path) = self.entry_path(key) {
            if let Err(e) = self.write_entry(&path, &entry) {
                tracing::warn!(key, error = %e, "Failed to persist cache entry");
            }
        }

        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(hash_key(key), entry);
        }
    }

    /// Remove one entry.
    pub fn delete(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(&hash_key(key));
        }
        if let Some(path) = self.entry_path(key) {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!(key, error = %e, "Failed to remove cache entry file");
                }
            }
        }
    }

    /// Remove all entries (memory and disk).
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }

        let Some(dir) = &self.dir else { return };
        let Ok(read_dir) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove cache file");
                }
            }
        }
    }

    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<serde_json::Value> {
        if !self.enabled {
            return None;
        }

        let hashed = hash_key(key);

        let memory_hit = self
            .entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(&hashed).cloned());

        let entry = match memory_hit {
            Some(entry) => entry,
            None => {
                let entry = self.read_entry(key)?;
                if let Ok(mut entries) = self.entries.lock() {
                    entries.insert(hashed, entry.clone());
                }
                entry
            }
        };

        if entry.is_expired(now) {
            tracing::debug!(key, "Evicting expired cache entry");
            self.delete(key);
            return None;
        }

        Some(entry.value)
    }

    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", hash_key(key))))
    }

    fn read_entry(&self, key: &str) -> Option<CacheEntry> {
        let path = self.entry_path(key)?;
        if !path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read cache entry, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(key, error = %e, "Corrupt cache entry, treating as miss");
                None
            }
        }
    }

    fn write_entry(&self, path: &Path, entry: &CacheEntry) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(entry)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

/// Hex SHA-256 of the logical key string.
fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
