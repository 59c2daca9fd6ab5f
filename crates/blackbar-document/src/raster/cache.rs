// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster cache — rendered pages keyed by (page, scale), expired lazily after
// a fixed time-to-live.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use image::RgbaImage;
use tracing::debug;

/// Cache key: page number plus the render scale rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub page: u32,
    /// Scale * 100, rounded.
    pub scale_centi: u32,
}

impl CacheKey {
    pub fn new(page: u32, scale: f32) -> Self {
        Self {
            page,
            scale_centi: (scale * 100.0).round() as u32,
        }
    }
}

/// An opaque RGBA rasterisation of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRaster {
    /// 1-indexed page number.
    pub page: u32,
    /// Scale the page was rendered at (pixels per point).
    pub scale: f32,
    pub image: RgbaImage,
}

impl PageRaster {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

struct CacheEntry {
    raster: Arc<PageRaster>,
    stored_at: Instant,
}

/// Entries plus the document generation they belong to. Kept under one lock
/// so a generation switch and an insert can never interleave.
#[derive(Default)]
struct CacheState {
    generation: u64,
    entries: HashMap<CacheKey, CacheEntry>,
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe page raster cache for one document generation at a time.
///
/// Values are shared as `Arc<PageRaster>`, so a reader always sees a complete
/// entry. Lookups and inserts name the generation they were made for; any
/// other generation misses or is refused.
pub struct RasterCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RasterCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Generation currently accepted.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Switch to `generation` and drop every entry.
    pub fn reset(&self, generation: u64) {
        let mut state = self.lock();
        let dropped = state.entries.len();
        state.generation = generation;
        state.entries.clear();
        debug!(generation, dropped, "Raster cache reset");
    }

    /// Look up a live entry. Expired entries and stale generations count as
    /// misses.
    pub fn get(&self, generation: u64, key: &CacheKey) -> Option<Arc<PageRaster>> {
        self.get_at(generation, key, Instant::now())
    }

    pub(crate) fn get_at(&self, generation: u64, key: &CacheKey, now: Instant) -> Option<Arc<PageRaster>> {
        let state = self.lock();
        let live = (state.generation == generation)
            .then(|| state.entries.get(key))
            .flatten()
            .filter(|entry| now.saturating_duration_since(entry.stored_at) < self.ttl);
        match live {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(&entry.raster))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a raster rendered for `generation`, replacing any previous entry
    /// for the key, and run a maintenance pass. Returns `false`, storing
    /// nothing, when the cache has moved on to another generation.
    pub fn insert(&self, generation: u64, key: CacheKey, raster: Arc<PageRaster>) -> bool {
        self.insert_at(generation, key, raster, Instant::now())
    }

    pub(crate) fn insert_at(
        &self,
        generation: u64,
        key: CacheKey,
        raster: Arc<PageRaster>,
        now: Instant,
    ) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        let evicted = evict_expired(&mut state.entries, self.ttl, now);
        state.entries.insert(
            key,
            CacheEntry {
                raster,
                stored_at: now,
            },
        );
        if evicted > 0 {
            debug!(evicted, remaining = state.entries.len(), "Raster cache maintenance");
        }
        true
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn maintain(&self) -> usize {
        self.maintain_at(Instant::now())
    }

    pub(crate) fn maintain_at(&self, now: Instant) -> usize {
        evict_expired(&mut self.lock().entries, self.ttl, now)
    }

    /// Drop everything, keeping the current generation.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        debug!(dropped, "Raster cache invalidated");
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

fn evict_expired(entries: &mut HashMap<CacheKey, CacheEntry>, ttl: Duration, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| now.saturating_duration_since(entry.stored_at) < ttl);
    before - entries.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn raster(page: u32) -> Arc<PageRaster> {
        Arc::new(PageRaster {
            page,
            scale: 1.0,
            image: RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255])),
        })
    }

    fn cache() -> RasterCache {
        let cache = RasterCache::new(Duration::from_secs(300));
        cache.reset(1);
        cache
    }

    #[test]
    fn key_rounds_scale_to_two_decimals() {
        assert_eq!(CacheKey::new(1, 1.499), CacheKey::new(1, 1.5));
        assert_ne!(CacheKey::new(1, 1.5), CacheKey::new(1, 1.51));
        assert_ne!(CacheKey::new(1, 1.5), CacheKey::new(2, 1.5));
    }

    #[test]
    fn one_entry_per_key() {
        let cache = cache();
        cache.insert(1, CacheKey::new(1, 1.5), raster(1));
        cache.insert(1, CacheKey::new(1, 1.5), raster(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entries_are_misses_and_evicted_on_maintenance() {
        let cache = cache();
        let start = Instant::now();
        let key = CacheKey::new(1, 1.5);
        cache.insert_at(1, key, raster(1), start);

        assert!(cache.get_at(1, &key, start + Duration::from_secs(299)).is_some());
        assert!(cache.get_at(1, &key, start + Duration::from_secs(301)).is_none());
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.maintain_at(start + Duration::from_secs(301)), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_runs_maintenance() {
        let cache = cache();
        let start = Instant::now();
        cache.insert_at(1, CacheKey::new(1, 1.0), raster(1), start);
        cache.insert_at(1, CacheKey::new(2, 1.0), raster(2), start + Duration::from_secs(400));
        assert_eq!(cache.len(), 1);
        assert!(cache
            .get_at(1, &CacheKey::new(2, 1.0), start + Duration::from_secs(401))
            .is_some());
    }

    #[test]
    fn invalidate_clears_everything() {
        let cache = cache();
        cache.insert(1, CacheKey::new(1, 1.0), raster(1));
        cache.insert(1, CacheKey::new(2, 1.0), raster(2));
        cache.invalidate();
        assert!(cache.is_empty());
    }

    #[test]
    fn stats_count_hits_and_misses() {
        let cache = cache();
        let key = CacheKey::new(1, 1.0);
        assert!(cache.get(1, &key).is_none());
        cache.insert(1, key, raster(1));
        assert!(cache.get(1, &key).is_some());
        let stats = cache.stats();
        assert_eq!((stats.entries, stats.hits, stats.misses), (1, 1, 1));
    }

    #[test]
    fn reset_refuses_inserts_from_the_previous_generation() {
        let cache = cache();
        let key = CacheKey::new(1, 1.0);
        assert!(cache.insert(1, key, raster(1)));

        cache.reset(2);
        assert!(cache.is_empty());
        assert!(!cache.insert(1, key, raster(1)));
        assert!(cache.is_empty());
        assert!(cache.get(2, &key).is_none());

        assert!(cache.insert(2, key, raster(1)));
        assert!(cache.get(1, &key).is_none());
        assert!(cache.get(2, &key).is_some());
    }
}
