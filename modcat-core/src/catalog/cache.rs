//! Catalog snapshot caching
//!
//! Snapshots are cached per locale under `<locale>_addons_modules` with a
//! one-day TTL. The cache provider owns expiry and its own concurrency
//! safety; the assembler only issues per-key get/set/delete.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::CatalogSnapshot;
use crate::error::{CatalogError, Result};

/// Suffix appended to the locale to form the cache key
pub const CACHE_KEY_SUFFIX: &str = "_addons_modules";

/// Default cache TTL (one day)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Cache key for a locale's catalog
pub fn cache_key(locale: &str) -> String {
    format!("{locale}{CACHE_KEY_SUFFIX}")
}

/// A keyed, time-expiring store of catalog snapshots
pub trait ExternalCache {
    /// Whether a non-expired entry exists for `key`
    fn contains(&self, key: &str) -> bool;

    /// Read a non-expired entry
    fn fetch(&self, key: &str) -> Option<CatalogSnapshot>;

    /// Read an entry ignoring expiry, for fallback after a failed refresh.
    ///
    /// Providers that evict on expiry can keep the default.
    fn fetch_stale(&self, key: &str) -> Option<CatalogSnapshot> {
        self.fetch(key)
    }

    fn save(&self, key: &str, snapshot: &CatalogSnapshot, ttl: Duration) -> Result<()>;

    fn delete(&self, key: &str) -> Result<()>;
}

/// Process-local cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    snapshot: CatalogSnapshot,
    /// `None` when the TTL overflows the clock
    expires_at: Option<Instant>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, key: &str, allow_expired: bool) -> Option<CatalogSnapshot> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;
        let expired = entry.expires_at.is_some_and(|at| Instant::now() >= at);
        if !allow_expired && expired {
            return None;
        }
        Some(entry.snapshot.clone())
    }
}

impl ExternalCache for MemoryCache {
    fn contains(&self, key: &str) -> bool {
        self.read(key, false).is_some()
    }

    fn fetch(&self, key: &str) -> Option<CatalogSnapshot> {
        self.read(key, false)
    }

    fn fetch_stale(&self, key: &str) -> Option<CatalogSnapshot> {
        self.read(key, true)
    }

    fn save(&self, key: &str, snapshot: &CatalogSnapshot, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| CatalogError::Cache {
            path: PathBuf::from(key),
            detail: "memory cache lock poisoned".to_string(),
        })?;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                snapshot: snapshot.clone(),
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| CatalogError::Cache {
            path: PathBuf::from(key),
            detail: "memory cache lock poisoned".to_string(),
        })?;
        entries.remove(key);
        Ok(())
    }
}

/// On-disk cache document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSnapshot {
    /// When the snapshot was cached
    pub cached_at: DateTime<Utc>,

    /// When the snapshot stops being served by `fetch`
    pub expires_at: DateTime<Utc>,

    pub modules: CatalogSnapshot,
}

impl CachedSnapshot {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Cache storing one JSON document per key in a directory
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Cache in the platform cache directory
    pub fn default_location() -> anyhow::Result<Self> {
        let dir = directories::ProjectDirs::from("io", "modcat", "modcat")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .or_else(|| dirs::cache_dir().map(|d| d.join("modcat")))
            .context("Could not determine cache directory")?;
        Ok(Self::new(dir))
    }

    /// Path of the document for a key
    pub fn path_for_key(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }

    /// Load the cache document for a key, expired or not
    pub fn load(&self, key: &str) -> Result<Option<CachedSnapshot>> {
        let path = self.path_for_key(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| CatalogError::Cache {
            path: path.clone(),
            detail: format!("reading cache entry: {e}"),
        })?;
        let cached: CachedSnapshot =
            serde_json::from_str(&content).map_err(|e| CatalogError::Cache {
                path: path.clone(),
                detail: format!("parsing cache entry: {e}"),
            })?;

        Ok(Some(cached))
    }

    fn read(&self, key: &str, allow_expired: bool) -> Option<CatalogSnapshot> {
        match self.load(key) {
            Ok(Some(cached)) => {
                if !allow_expired && cached.is_expired() {
                    tracing::debug!("Cache expired for {} (cached at {})", key, cached.cached_at);
                    return None;
                }
                tracing::debug!("Using cached catalog for {} (cached at {})", key, cached.cached_at);
                Some(cached.modules)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!("Ignoring unreadable cache entry for {}: {}", key, e);
                None
            }
        }
    }
}

impl ExternalCache for FileCache {
    fn contains(&self, key: &str) -> bool {
        matches!(self.load(key), Ok(Some(cached)) if !cached.is_expired())
    }

    fn fetch(&self, key: &str) -> Option<CatalogSnapshot> {
        self.read(key, false)
    }

    fn fetch_stale(&self, key: &str) -> Option<CatalogSnapshot> {
        self.read(key, true)
    }

    fn save(&self, key: &str, snapshot: &CatalogSnapshot, ttl: Duration) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| CatalogError::Cache {
            path: self.dir.clone(),
            detail: format!("creating cache dir: {e}"),
        })?;

        let cached_at = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| cached_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let cached = CachedSnapshot {
            cached_at,
            expires_at,
            modules: snapshot.clone(),
        };
        let content = serde_json::to_vec(&cached)?;

        // Write to a sibling temp file and rename so readers never see a
        // partial document
        let path = self.path_for_key(key);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&content)?;
        tmp.persist(&path).map_err(|e| CatalogError::Cache {
            path: path.clone(),
            detail: format!("writing cache entry: {e}"),
        })?;

        tracing::debug!("Saved catalog to cache: {}", path.display());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for_key(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CatalogError::Cache {
                path,
                detail: format!("removing cache entry: {e}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleRecord;
    use tempfile::TempDir;

    fn snapshot() -> CatalogSnapshot {
        ["blog", "paypal"].into_iter().map(ModuleRecord::named).collect()
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(cache_key("fr"), "fr_addons_modules");
    }

    #[test]
    fn test_memory_cache_save_fetch_delete() {
        let cache = MemoryCache::new();
        let key = cache_key("en");
        assert!(!cache.contains(&key));

        cache.save(&key, &snapshot(), DEFAULT_CACHE_TTL).unwrap();
        assert!(cache.contains(&key));
        assert_eq!(cache.fetch(&key).unwrap().len(), 2);

        cache.delete(&key).unwrap();
        assert!(!cache.contains(&key));
        assert!(cache.fetch_stale(&key).is_none());
    }

    #[test]
    fn test_memory_cache_delete_reports_poisoned_lock() {
        let cache = MemoryCache::new();
        let key = cache_key("en");
        cache.save(&key, &snapshot(), DEFAULT_CACHE_TTL).unwrap();

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = cache.entries.lock().unwrap();
            panic!("writer died holding the lock");
        }));

        assert!(matches!(cache.delete(&key), Err(CatalogError::Cache { .. })));
    }

    #[test]
    fn test_memory_cache_expiry_keeps_stale_copy() {
        let cache = MemoryCache::new();
        let key = cache_key("en");
        cache.save(&key, &snapshot(), Duration::ZERO).unwrap();

        assert!(!cache.contains(&key));
        assert!(cache.fetch(&key).is_none());
        assert_eq!(cache.fetch_stale(&key).unwrap().len(), 2);
    }

    #[test]
    fn test_file_cache_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path().join("cache"));
        let key = cache_key("de");

        cache.save(&key, &snapshot(), DEFAULT_CACHE_TTL).unwrap();
        assert!(cache.contains(&key));
        assert!(cache.path_for_key(&key).ends_with("de_addons_modules.json"));

        let loaded = cache.fetch(&key).unwrap();
        assert_eq!(loaded, snapshot());
    }

    #[test]
    fn test_file_cache_expired_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path().to_path_buf());
        let key = cache_key("de");

        cache.save(&key, &snapshot(), Duration::ZERO).unwrap();
        assert!(!cache.contains(&key));
        assert!(cache.fetch(&key).is_none());
        assert_eq!(cache.fetch_stale(&key).unwrap().len(), 2);
    }

    #[test]
    fn test_file_cache_corrupt_entry_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path().to_path_buf());
        let key = cache_key("de");
        std::fs::write(cache.path_for_key(&key), "not json").unwrap();

        assert!(!cache.contains(&key));
        assert!(cache.fetch_stale(&key).is_none());
        assert!(cache.load(&key).is_err());
    }

    #[test]
    fn test_file_cache_delete_missing_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::new(temp_dir.path().to_path_buf());
        cache.delete(&cache_key("xx")).unwrap();
    }

    #[test]
    fn test_path_for_key_sanitizes() {
        let cache = FileCache::new(PathBuf::from("/tmp/modcat"));
        let path = cache.path_for_key("../etc/passwd");
        assert_eq!(path, PathBuf::from("/tmp/modcat/___etc_passwd.json"));
    }
}
