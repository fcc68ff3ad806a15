use crate::cache::{CacheConfig, CacheEntry};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// In-memory response cache with TTL support.
///
/// Reads and writes are not mutually exclusive across concurrent requests
/// for the same key; the last successful write within the TTL window wins.
#[derive(Clone)]
pub struct ResponseCache {
    /// Cache storage
    storage: Arc<RwLock<HashMap<String, CacheEntry>>>,
    /// Cache configuration
    config: CacheConfig,
    /// Cache metrics
    metrics: Arc<RwLock<CacheMetrics>>,
    /// Maximum cache size in bytes
    max_size: u64,
    /// Current cache size in bytes
    current_size: Arc<RwLock<u64>>,
}

impl ResponseCache {
    /// Create a new in-memory response cache
    pub fn new(config: CacheConfig) -> Self {
        let cache = Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            max_size: config.max_size,
            config,
            metrics: Arc::new(RwLock::new(CacheMetrics::default())),
            current_size: Arc::new(RwLock::new(0)),
        };

        // Start cleanup task
        if cache.config.enabled {
            cache.start_cleanup_task();
        }

        cache
    }

    /// TTL applied to stored entries
    pub fn entry_ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl)
    }

    /// Get a cached entry
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        if !self.config.enabled {
            return None;
        }

        let storage = self.storage.read().await;

        if let Some(entry) = storage.get(key) {
            if entry.is_expired() {
                // Entry is expired, will be cleaned up later
                self.record_miss().await;
                None
            } else {
                self.record_hit().await;
                Some(entry.clone())
            }
        } else {
            self.record_miss().await;
            None
        }
    }

    /// Store an entry in the cache
    pub async fn put(&self, key: String, entry: CacheEntry) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let entry_size = entry.size as u64;

        if let Err(e) = self.ensure_space(entry_size).await {
            warn!("Failed to ensure space for cache entry: {}", e);
            return Err(e);
        }

        {
            let mut storage = self.storage.write().await;

            // If key already exists, subtract old size first
            if let Some(old_entry) = storage.get(&key) {
                let mut current_size = self.current_size.write().await;
                *current_size -= old_entry.size as u64;
            }

            storage.insert(key, entry);
        }

        {
            let mut current_size = self.current_size.write().await;
            *current_size += entry_size;
        }

        self.record_store().await;

        debug!("Stored cache entry of size {} bytes", entry_size);
        Ok(())
    }

    /// Clear all cache entries
    pub async fn clear(&self) {
        let mut storage = self.storage.write().await;
        storage.clear();

        let mut current_size = self.current_size.write().await;
        *current_size = 0;

        info!("Cache cleared");
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let storage = self.storage.read().await;
        let metrics = self.metrics.read().await;
        let current_size = *self.current_size.read().await;

        CacheStats {
            entry_count: storage.len(),
            total_size: current_size,
            max_size: self.max_size,
            hits: metrics.hits,
            misses: metrics.misses,
            stores: metrics.stores,
            evictions: metrics.evictions,
        }
    }

    /// Ensure there's enough space for a new entry
    async fn ensure_space(&self, needed_size: u64) -> Result<()> {
        let current_size = *self.current_size.read().await;

        if current_size + needed_size <= self.max_size {
            return Ok(());
        }

        let target_size = self.max_size.saturating_sub(needed_size);
        self.evict_until_size(target_size).await
    }

    /// Evict entries until cache size is below target
    async fn evict_until_size(&self, target_size: u64) -> Result<()> {
        let mut storage = self.storage.write().await;
        let mut current_size = self.current_size.write().await;

        let mut entries: Vec<(String, SystemTime, u64)> = storage
            .iter()
            .map(|(key, entry)| (key.clone(), entry.created_at, entry.size as u64))
            .collect();

        // Oldest entries first
        entries.sort_by_key(|(_, created_at, _)| *created_at);

        let mut evicted_count = 0;

        for (key, _, entry_size) in entries {
            if *current_size <= target_size {
                break;
            }

            storage.remove(&key);
            *current_size -= entry_size;
            evicted_count += 1;

            debug!("Evicted cache entry: {} (size: {} bytes)", key, entry_size);
        }

        if evicted_count > 0 {
            let mut metrics = self.metrics.write().await;
            metrics.evictions += evicted_count;

            info!("Evicted {} cache entries to free space", evicted_count);
        }

        Ok(())
    }

    /// Start background cleanup task
    fn start_cleanup_task(&self) {
        let storage = Arc::clone(&self.storage);
        let current_size = Arc::clone(&self.current_size);

        tokio::spawn(async move {
            let mut cleanup_interval = interval(Duration::from_secs(60));

            loop {
                cleanup_interval.tick().await;

                let mut removed_count = 0;
                let mut removed_size = 0u64;

                {
                    let mut storage_guard = storage.write().await;
                    let mut to_remove = Vec::new();

                    for (key, entry) in storage_guard.iter() {
                        if entry.is_expired() {
                            to_remove.push((key.clone(), entry.size as u64));
                        }
                    }

                    for (key, size) in to_remove {
                        storage_guard.remove(&key);
                        removed_size += size;
                        removed_count += 1;
                    }
                }

                if removed_size > 0 {
                    let mut current_size_guard = current_size.write().await;
                    *current_size_guard -= removed_size;
                }

                if removed_count > 0 {
                    debug!(
                        "Cleaned up {} expired cache entries (freed {} bytes)",
                        removed_count, removed_size
                    );
                }
            }
        });
    }

    /// Record a cache hit
    async fn record_hit(&self) {
        if !self.config.metrics_enabled {
            return;
        }
        let mut metrics = self.metrics.write().await;
        metrics.hits += 1;
    }

    /// Record a cache miss
    async fn record_miss(&self) {
        if !self.config.metrics_enabled {
            return;
        }
        let mut metrics = self.metrics.write().await;
        metrics.misses += 1;
    }

    /// Record a cache store
    async fn record_store(&self) {
        if !self.config.metrics_enabled {
            return;
        }
        let mut metrics = self.metrics.write().await;
        metrics.stores += 1;
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: usize,
    /// Total size in bytes
    pub total_size: u64,
    /// Maximum size in bytes
    pub max_size: u64,
    /// Total cache hits
    pub hits: u64,
    /// Total cache misses
    pub misses: u64,
    /// Total stores
    pub stores: u64,
    /// Total evictions
    pub evictions: u64,
}

/// Cache hit/miss counters
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub evictions: u64,
}

impl CacheMetrics {
    /// Calculate hit ratio as percentage
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            (self.hits as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}
