// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory handle cache.
//!
//! Maps a file path to its parsed [`IfcModel`] so repeated extraction calls
//! against the same file pay the parse cost once. Strict LRU eviction
//! bounded by entry count, plus a time-to-live on each entry.
//!
//! The cache is a single-threaded structure: promotion on hit and eviction
//! are compound read-modify-write sequences. A host serving concurrent
//! callers must wrap the whole cache in one exclusive lock (`Mutex`); the
//! handles it returns are `Arc`-shared and safe to read concurrently.

use crate::error::ExtractError;
use ifc_intel_model::IfcModel;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct CacheEntry {
    path: PathBuf,
    handle: Arc<IfcModel>,
    last_access: Instant,
    size_bytes: u64,
}

/// LRU + TTL cache of parsed file handles
pub struct ModelCache {
    max_entries: usize,
    ttl: Duration,
    /// Recency order: index 0 is least recently used.
    entries: Vec<CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

/// Cache statistics snapshot. Reading it never mutates the cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub hit_rate: f64,
    pub total_requests: u64,
    pub cached_files: Vec<String>,
    pub total_size_bytes: u64,
    pub ttl_secs: u64,
}

impl ModelCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            max_entries: max_entries.max(1),
            ttl,
            entries: Vec::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    /// Get a cached handle or load the file.
    ///
    /// The check order is fixed: presence, then TTL, then either promote
    /// (hit) or drop the expired entry and reload. A reload verifies the
    /// path exists before parsing, and evicts the least recently used entry
    /// when the cache is full.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<IfcModel>, ExtractError> {
        if let Some(position) = self.entries.iter().position(|e| e.path == path) {
            if self.entries[position].last_access.elapsed() < self.ttl {
                let mut entry = self.entries.remove(position);
                entry.last_access = Instant::now();
                let handle = entry.handle.clone();
                self.entries.push(entry);
                self.hits += 1;
                tracing::debug!(path = %path.display(), "cache hit");
                return Ok(handle);
            }
            // Expired: neither a hit nor an eviction, tracked separately.
            self.entries.remove(position);
            self.expirations += 1;
            tracing::debug!(path = %path.display(), "cache entry expired");
        }

        self.misses += 1;
        tracing::debug!(path = %path.display(), "cache miss");

        if !path.exists() {
            return Err(ExtractError::NotFound(format!(
                "IFC file not found: {}",
                path.display()
            )));
        }

        let handle = Arc::new(IfcModel::open(path).map_err(ExtractError::Load)?);
        let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        if self.entries.len() >= self.max_entries {
            let evicted = self.entries.remove(0);
            self.evictions += 1;
            tracing::debug!(path = %evicted.path.display(), "cache evict");
        }

        tracing::debug!(
            path = %path.display(),
            size_bytes,
            entities = handle.len(),
            skipped_lines = handle.skipped_lines(),
            "cache load"
        );

        self.entries.push(CacheEntry {
            path: path.to_path_buf(),
            handle: handle.clone(),
            last_access: Instant::now(),
            size_bytes,
        });

        Ok(handle)
    }

    /// Remove one entry. Removing an absent path is a no-op.
    pub fn remove(&mut self, path: &Path) {
        if let Some(position) = self.entries.iter().position(|e| e.path == path) {
            self.entries.remove(position);
            tracing::debug!(path = %path.display(), "cache remove");
        }
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        tracing::debug!("cache clear");
    }

    /// Statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        let total_requests = self.hits + self.misses;
        let hit_rate = if total_requests > 0 {
            (self.hits as f64 / total_requests as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };

        CacheStats {
            size: self.entries.len(),
            max_entries: self.max_entries,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            expirations: self.expirations,
            hit_rate,
            total_requests,
            cached_files: self
                .entries
                .iter()
                .map(|e| e.path.display().to_string())
                .collect(),
            total_size_bytes: self.entries.iter().map(|e| e.size_bytes).sum(),
            ttl_secs: self.ttl.as_secs(),
        }
    }

    /// Shrink the TTL after the fact, so expiry is testable without
    /// wall-clock sleeps.
    #[cfg(test)]
    fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MINIMAL_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('3vB2YO$MX4xv5uCqZZG0Xq',$,'P',$,$,$,$,(),$);
ENDSEC;
END-ISO-10303-21;
"#;

    fn write_fixtures(dir: &TempDir, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.path().join(format!("model-{}.ifc", i));
                fs::write(&path, MINIMAL_IFC).unwrap();
                path
            })
            .collect()
    }

    fn ttl_hours(hours: u64) -> Duration {
        Duration::from_secs(hours * 3600)
    }

    #[test]
    fn test_hit_after_load() {
        let dir = TempDir::new().unwrap();
        let paths = write_fixtures(&dir, 1);
        let mut cache = ModelCache::new(4, ttl_hours(24));

        let first = cache.get_or_load(&paths[0]).unwrap();
        let second = cache.get_or_load(&paths[0]).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.hit_rate, 50.0);
    }

    #[test]
    fn test_lru_eviction_order() {
        // Loading N+1 distinct paths evicts the first one loaded.
        let dir = TempDir::new().unwrap();
        let paths = write_fixtures(&dir, 4);
        let mut cache = ModelCache::new(3, ttl_hours(24));

        for path in &paths {
            cache.get_or_load(path).unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.size, 3);
        assert!(!stats.cached_files.contains(&paths[0].display().to_string()));
        for path in &paths[1..] {
            assert!(stats.cached_files.contains(&path.display().to_string()));
        }
    }

    #[test]
    fn test_recency_promotion_protects_reaccessed_entry() {
        // Re-accessing the oldest entry before overflow evicts the
        // second-oldest instead.
        let dir = TempDir::new().unwrap();
        let paths = write_fixtures(&dir, 4);
        let mut cache = ModelCache::new(3, ttl_hours(24));

        cache.get_or_load(&paths[0]).unwrap();
        cache.get_or_load(&paths[1]).unwrap();
        cache.get_or_load(&paths[2]).unwrap();
        cache.get_or_load(&paths[0]).unwrap(); // promote oldest
        cache.get_or_load(&paths[3]).unwrap(); // overflow

        let stats = cache.stats();
        assert!(stats.cached_files.contains(&paths[0].display().to_string()));
        assert!(!stats.cached_files.contains(&paths[1].display().to_string()));
        assert!(stats.cached_files.contains(&paths[2].display().to_string()));
        assert!(stats.cached_files.contains(&paths[3].display().to_string()));
    }

    #[test]
    fn test_ttl_expiry_reloads() {
        let dir = TempDir::new().unwrap();
        let paths = write_fixtures(&dir, 1);
        let mut cache = ModelCache::new(4, ttl_hours(1));

        cache.get_or_load(&paths[0]).unwrap();
        cache.set_ttl(Duration::ZERO);
        cache.get_or_load(&paths[0]).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn test_remove_and_clear_are_idempotent() {
        let dir = TempDir::new().unwrap();
        let paths = write_fixtures(&dir, 1);
        let mut cache = ModelCache::new(4, ttl_hours(24));

        cache.remove(Path::new("/no/such/file.ifc"));
        cache.clear();
        let before = cache.stats();
        assert_eq!(before.size, 0);
        assert_eq!(before.total_requests, 0);

        cache.get_or_load(&paths[0]).unwrap();
        cache.remove(&paths[0]);
        cache.remove(&paths[0]);
        assert_eq!(cache.stats().size, 0);

        cache.clear();
        cache.clear();
        let after = cache.stats();
        assert_eq!(after.size, 0);
        assert_eq!(after.misses, 1);
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let mut cache = ModelCache::new(4, ttl_hours(24));
        let err = cache.get_or_load(Path::new("/no/such/file.ifc")).unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_invalid_file_is_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.ifc");
        fs::write(&path, "this is not a STEP file").unwrap();

        let mut cache = ModelCache::new(4, ttl_hours(24));
        let err = cache.get_or_load(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Load(_)));
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_stats_is_pure() {
        let dir = TempDir::new().unwrap();
        let paths = write_fixtures(&dir, 1);
        let mut cache = ModelCache::new(4, ttl_hours(1));

        cache.get_or_load(&paths[0]).unwrap();
        cache.set_ttl(Duration::ZERO);

        // An expired entry stays visible to stats until the next lookup.
        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.expirations, 0);
        assert_eq!(cache.stats().size, 1);
    }
}
