//! Memory cache of produced canvas images.
//!
//! Consulted by the provider before it creates a decode task, so a repeated
//! request for the same key completes without touching the backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::decode::CanvasImage;
use crate::source::ImageSourceKey;

#[derive(Debug)]
struct CacheEntry {
    image: Arc<CanvasImage>,
    last_accessed: Instant,
    /// Access order; larger is more recent.
    tick: u64,
    size_bytes: usize,
}

/// Limits of the image cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageCacheConfig {
    /// Maximum total pixel bytes.
    pub max_size_bytes: usize,
    /// Seconds an entry may go unused before it expires.
    pub max_age_secs: u64,
    /// Maximum number of entries. Zero disables the cache.
    pub max_entries: usize,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 64 * 1024 * 1024, // 64 MB
            max_age_secs: 300,
            max_entries: 256,
        }
    }
}

impl ImageCacheConfig {
    /// Maximum idle time of an entry.
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that found an image.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries dropped to respect the limits.
    pub evictions: u64,
    /// Total bytes inserted.
    pub bytes_inserted: u64,
}

/// LRU cache of canvas images with byte, entry and age limits.
#[derive(Debug)]
pub struct ImageCache {
    entries: HashMap<ImageSourceKey, CacheEntry>,
    config: ImageCacheConfig,
    current_size: usize,
    next_tick: u64,
    stats: CacheStats,
}

impl ImageCache {
    /// Cache with the default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ImageCacheConfig::default())
    }

    /// Cache with custom limits.
    #[must_use]
    pub fn with_config(config: ImageCacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            current_size: 0,
            next_tick: 0,
            stats: CacheStats::default(),
        }
    }

    fn tick(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }

    /// Look up `key`, refreshing its recency. Expired entries count as misses.
    pub fn get(&mut self, key: &ImageSourceKey) -> Option<Arc<CanvasImage>> {
        let max_age = self.config.max_age();
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.last_accessed.elapsed() > max_age);
        if expired {
            self.remove_entry(key);
            self.stats.evictions += 1;
        }

        let tick = self.tick();
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_accessed = Instant::now();
            entry.tick = tick;
            self.stats.hits += 1;
            Some(Arc::clone(&entry.image))
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Insert an image, evicting older entries as needed.
    ///
    /// Images larger than the whole cache are not stored.
    pub fn insert(&mut self, key: ImageSourceKey, image: Arc<CanvasImage>) {
        self.remove_entry(&key);
        let size_bytes = image.byte_size();
        if self.config.max_entries == 0 || size_bytes > self.config.max_size_bytes {
            tracing::trace!("Not caching {key} ({size_bytes} bytes)");
            return;
        }

        self.evict_if_needed(size_bytes);
        self.current_size += size_bytes;
        self.stats.bytes_inserted += size_bytes as u64;
        let tick = self.tick();
        self.entries.insert(
            key,
            CacheEntry {
                image,
                last_accessed: Instant::now(),
                tick,
                size_bytes,
            },
        );
    }

    /// Remove `key`, returning its image.
    pub fn remove(&mut self, key: &ImageSourceKey) -> Option<Arc<CanvasImage>> {
        self.remove_entry(key)
    }

    fn remove_entry(&mut self, key: &ImageSourceKey) -> Option<Arc<CanvasImage>> {
        let entry = self.entries.remove(key)?;
        self.current_size -= entry.size_bytes;
        Some(entry.image)
    }

    /// Check if `key` is cached, without touching statistics.
    #[must_use]
    pub fn contains(&self, key: &ImageSourceKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_size = 0;
    }

    /// Number of cached images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total pixel bytes held.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.current_size
    }

    /// Statistics so far.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn evict_if_needed(&mut self, needed_bytes: usize) {
        self.evict_expired();
        while self.current_size + needed_bytes > self.config.max_size_bytes
            && !self.entries.is_empty()
        {
            self.evict_lru();
        }
        while self.entries.len() >= self.config.max_entries && !self.entries.is_empty() {
            self.evict_lru();
        }
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.tick)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            tracing::trace!("Evicting {key}");
            self.remove_entry(&key);
            self.stats.evictions += 1;
        }
    }

    fn evict_expired(&mut self) {
        let max_age = self.config.max_age();
        let expired: Vec<ImageSourceKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.last_accessed.elapsed() > max_age)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.remove_entry(&key);
            self.stats.evictions += 1;
        }
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}
