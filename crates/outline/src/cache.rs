//! In-memory structure cache.
//!
//! Entries are keyed by file path and carry the fingerprint (modification time
//! and SHA-256 of the bytes) observed when the structure was extracted. A hit
//! is only served after the fingerprint still matches the file on disk: the
//! modification time is compared first and the content is re-hashed only when
//! it is unchanged. Capacity is bounded with exact LRU eviction, entries expire
//! after a TTL, and an optional tokio task sweeps expired entries.

use chrono::{DateTime, Utc};
use mdatlas_core::{AppError, AppResult, CacheConfig};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::types::DocumentStructure;

/// SHA-256 of `bytes`, hex-encoded.
pub fn content_hash(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// What a file looked like when its structure was extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub modified: SystemTime,
    pub hash: String,
}

impl Fingerprint {
    pub fn new(modified: SystemTime, bytes: &[u8]) -> Self {
        Self {
            modified,
            hash: content_hash(bytes),
        }
    }

    /// Fingerprint the file at `path` as it is now.
    pub fn read(path: &Path) -> AppResult<Self> {
        let modified = modified_time(path)?;
        let bytes = std::fs::read(path).map_err(|e| AppError::file_read(path, e))?;
        Ok(Self::new(modified, &bytes))
    }

    /// Whether `path` still matches this fingerprint. Any I/O failure counts
    /// as a mismatch.
    fn matches_file(&self, path: &Path) -> bool {
        match modified_time(path) {
            Ok(modified) if modified == self.modified => {}
            Ok(_) => return false,
            Err(e) => {
                tracing::debug!("Freshness check failed for {}: {}", path.display(), e);
                return false;
            }
        }

        match std::fs::read(path) {
            Ok(bytes) => content_hash(&bytes) == self.hash,
            Err(e) => {
                tracing::debug!("Freshness check failed for {}: {}", path.display(), e);
                false
            }
        }
    }
}

/// Modification time of `path`.
pub fn modified_time(path: &Path) -> AppResult<SystemTime> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| AppError::file_read(path, e))
}

#[derive(Debug)]
struct CacheEntry {
    structure: Arc<DocumentStructure>,
    fingerprint: Fingerprint,
    last_accessed: Instant,
    accessed_at: DateTime<Utc>,
    access_seq: u64,
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub ttl_secs: u64,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}

/// Path-keyed cache of extracted document structures.
#[derive(Debug)]
pub struct StructureCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
    max_entries: usize,
    ttl: Duration,
    sweep_interval: Duration,
    access_counter: AtomicU64,
}

impl StructureCache {
    pub fn new(config: CacheConfig) -> Self {
        let config = config.normalized();
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: config.max_entries,
            ttl: config.ttl(),
            sweep_interval: config.sweep_interval(),
            access_counter: AtomicU64::new(0),
        }
    }

    /// Override the entry time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the background sweep period. Zero keeps the configured period.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.sweep_interval = interval;
        }
        self
    }

    // Every critical section leaves the map consistent, so a poisoned lock is
    // still safe to use.
    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_seq(&self) -> u64 {
        self.access_counter.fetch_add(1, Ordering::Relaxed)
    }

    fn touch(&self, entry: &mut CacheEntry) {
        entry.last_accessed = Instant::now();
        entry.accessed_at = Utc::now();
        entry.access_seq = self.next_seq();
    }

    /// Cached structure for `path`, if present, unexpired and still matching
    /// the file on disk. Expired and stale entries are dropped.
    pub fn get(&self, path: &Path) -> Option<Arc<DocumentStructure>> {
        let (fingerprint, last_accessed) = {
            let entries = self.read_entries();
            let entry = entries.get(path)?;
            (entry.fingerprint.clone(), entry.last_accessed)
        };

        if last_accessed.elapsed() > self.ttl {
            tracing::debug!("Cache entry expired: {}", path.display());
            self.remove_if_unchanged(path, &fingerprint);
            return None;
        }

        // File I/O happens without holding the lock.
        if !fingerprint.matches_file(path) {
            tracing::debug!("Cache entry stale: {}", path.display());
            self.remove_if_unchanged(path, &fingerprint);
            return None;
        }

        let mut entries = self.write_entries();
        let entry = entries.get_mut(path)?;
        // Replaced while we were checking the file; let the caller re-read.
        if entry.fingerprint != fingerprint {
            return None;
        }
        self.touch(entry);
        tracing::trace!("Cache hit: {}", path.display());
        Some(Arc::clone(&entry.structure))
    }

    /// Cached structure for `path` if it was extracted from content with
    /// exactly this fingerprint. Skips the disk check.
    pub fn get_matching(&self, path: &Path, fingerprint: &Fingerprint) -> Option<Arc<DocumentStructure>> {
        let mut entries = self.write_entries();
        let entry = entries.get_mut(path)?;
        if entry.fingerprint != *fingerprint || entry.last_accessed.elapsed() > self.ttl {
            return None;
        }
        self.touch(entry);
        Some(Arc::clone(&entry.structure))
    }

    /// Fingerprint `path` now and cache `structure` for it.
    pub fn set(&self, path: &Path, structure: impl Into<Arc<DocumentStructure>>) -> AppResult<()> {
        let fingerprint = Fingerprint::read(path)?;
        self.insert(path, structure, fingerprint);
        Ok(())
    }

    /// Cache `structure` under a fingerprint the caller already observed.
    pub fn insert(
        &self,
        path: &Path,
        structure: impl Into<Arc<DocumentStructure>>,
        fingerprint: Fingerprint,
    ) {
        let now = Utc::now();
        let entry = CacheEntry {
            structure: structure.into(),
            fingerprint,
            last_accessed: Instant::now(),
            accessed_at: now,
            access_seq: self.next_seq(),
        };

        let mut entries = self.write_entries();
        if !entries.contains_key(path) && entries.len() >= self.max_entries {
            let lru = entries
                .iter()
                .min_by_key(|(_, e)| e.access_seq)
                .map(|(p, _)| p.clone());
            if let Some(lru) = lru {
                tracing::debug!("Evicting least recently used entry: {}", lru.display());
                entries.remove(&lru);
            }
        }
        entries.insert(path.to_path_buf(), entry);
    }

    fn remove_if_unchanged(&self, path: &Path, fingerprint: &Fingerprint) {
        let mut entries = self.write_entries();
        if entries
            .get(path)
            .is_some_and(|entry| entry.fingerprint == *fingerprint)
        {
            entries.remove(path);
        }
    }

    /// Drop the entry for `path`. Returns whether one existed.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.write_entries().remove(path).is_some()
    }

    pub fn clear(&self) {
        self.write_entries().clear();
    }

    /// Drop every entry whose last access is older than the TTL.
    pub fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut entries = self.write_entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.last_accessed.elapsed() <= ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.read_entries();
        CacheStats {
            size: entries.len(),
            max_size: self.max_entries,
            ttl_secs: self.ttl.as_secs(),
            oldest_entry: entries.values().map(|e| e.accessed_at).min(),
            newest_entry: entries.values().map(|e| e.accessed_at).max(),
        }
    }

    /// Cached paths, sorted.
    pub fn cached_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.read_entries().keys().cloned().collect();
        files.sort();
        files
    }

    /// Start the periodic expiry sweep on the current tokio runtime.
    ///
    /// The task only holds a weak reference and exits once the cache is
    /// dropped, the handle is shut down, or the handle is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> SweepHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let cache = Arc::downgrade(self);
        let period = self.sweep_interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(cache) = cache.upgrade() else {
                            break;
                        };
                        let purged = cache.purge_expired();
                        if purged > 0 {
                            tracing::debug!("Cache sweep removed {} expired entries", purged);
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Cache sweeper stopped");
        });

        SweepHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to the background sweep task.
#[derive(Debug)]
pub struct SweepHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Signal the sweeper and wait for it to exit.
    pub async fn shutdown(self) {
        // The task may already be gone if the cache was dropped.
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!("Cache sweeper ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract;
    use std::fs;
    use tempfile::TempDir;

    fn write_doc(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn structure_of(path: &Path) -> DocumentStructure {
        extract(&fs::read(path).unwrap()).unwrap()
    }

    fn small_cache(max_entries: usize) -> StructureCache {
        StructureCache::new(CacheConfig {
            max_entries,
            ..CacheConfig::default()
        })
    }

    #[test]
    fn test_set_then_get_returns_same_structure() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "a.md", "# A\n\n## B\n");
        let cache = small_cache(10);

        let structure = Arc::new(structure_of(&path));
        cache.set(&path, Arc::clone(&structure)).unwrap();

        let cached = cache.get(&path).unwrap();
        assert!(Arc::ptr_eq(&cached, &structure));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_modified_content_is_stale() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "a.md", "# A\n");
        let cache = small_cache(10);
        cache.set(&path, structure_of(&path)).unwrap();

        fs::write(&path, "# Z\n").unwrap();

        assert!(cache.get(&path).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_same_mtime_different_content_is_stale() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "a.md", "# A\n");
        let cache = small_cache(10);
        cache.set(&path, structure_of(&path)).unwrap();
        let original = fs::metadata(&path).unwrap().modified().unwrap();

        fs::write(&path, "# Z\n").unwrap();
        fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(original)
            .unwrap();
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), original);

        assert!(cache.get(&path).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_deleted_file_is_stale() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "a.md", "# A\n");
        let cache = small_cache(10);
        cache.set(&path, structure_of(&path)).unwrap();

        fs::remove_file(&path).unwrap();
        assert!(cache.get(&path).is_none());
    }

    #[test]
    fn test_set_missing_file_stores_nothing() {
        let dir = TempDir::new().unwrap();
        let cache = small_cache(10);
        let path = dir.path().join("missing.md");

        let result = cache.set(&path, extract(b"# A\n").unwrap());
        assert!(matches!(result, Err(AppError::FileRead { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_eviction_is_exact() {
        let dir = TempDir::new().unwrap();
        let a = write_doc(&dir, "a.md", "# A\n");
        let b = write_doc(&dir, "b.md", "# B\n");
        let c = write_doc(&dir, "c.md", "# C\n");
        let cache = small_cache(2);

        cache.set(&a, structure_of(&a)).unwrap();
        cache.set(&b, structure_of(&b)).unwrap();
        assert!(cache.get(&a).is_some());

        cache.set(&c, structure_of(&c)).unwrap();

        assert_eq!(cache.cached_files(), {
            let mut expected = vec![a.clone(), c.clone()];
            expected.sort();
            expected
        });
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let dir = TempDir::new().unwrap();
        let a = write_doc(&dir, "a.md", "# A\n");
        let b = write_doc(&dir, "b.md", "# B\n");
        let cache = small_cache(2);

        cache.set(&a, structure_of(&a)).unwrap();
        cache.set(&b, structure_of(&b)).unwrap();
        cache.set(&a, structure_of(&a)).unwrap();

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_ttl_expiry() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "a.md", "# A\n");
        let cache = small_cache(10).with_ttl(Duration::from_millis(30));
        cache.set(&path, structure_of(&path)).unwrap();

        std::thread::sleep(Duration::from_millis(80));

        assert!(cache.get(&path).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "a.md", "# A\n");
        let cache = small_cache(10).with_ttl(Duration::from_millis(30));
        cache.set(&path, structure_of(&path)).unwrap();

        assert_eq!(cache.purge_expired(), 0);
        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(cache.purge_expired(), 1);
    }

    #[test]
    fn test_get_matching_requires_same_fingerprint() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "a.md", "# A\n");
        let cache = small_cache(10);
        let fingerprint = Fingerprint::read(&path).unwrap();
        cache.insert(&path, structure_of(&path), fingerprint.clone());

        assert!(cache.get_matching(&path, &fingerprint).is_some());

        let other = Fingerprint::new(fingerprint.modified, b"# B\n");
        assert!(cache.get_matching(&path, &other).is_none());
    }

    #[test]
    fn test_stats_and_invalidate() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "a.md", "# A\n");
        let cache = small_cache(5);

        let empty = cache.stats();
        assert_eq!((empty.size, empty.max_size), (0, 5));
        assert!(empty.oldest_entry.is_none());

        cache.set(&path, structure_of(&path)).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.ttl_secs, 1800);
        assert!(stats.oldest_entry.is_some());
        assert_eq!(stats.oldest_entry, stats.newest_entry);

        assert!(cache.invalidate(&path));
        assert!(!cache.invalidate(&path));
    }

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_sweeper_purges_and_shuts_down() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "a.md", "# A\n");
        let cache = Arc::new(
            small_cache(10)
                .with_ttl(Duration::from_millis(20))
                .with_sweep_interval(Duration::from_millis(10)),
        );
        cache.set(&path, structure_of(&path)).unwrap();

        let handle = cache.spawn_sweeper();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.is_empty());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_zero_sweep_interval_keeps_configured_period() {
        let cache = Arc::new(small_cache(10).with_sweep_interval(Duration::ZERO));
        assert_eq!(cache.sweep_interval, CacheConfig::default().sweep_interval());

        let handle = cache.spawn_sweeper();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_sweeper_stops_when_cache_dropped() {
        let cache = Arc::new(small_cache(10).with_sweep_interval(Duration::from_millis(10)));
        let handle = cache.spawn_sweeper();
        drop(cache);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished());
    }
}
