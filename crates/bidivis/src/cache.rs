#![forbid(unsafe_code)]

//! LRU cache for reordered paragraphs.
//!
//! Renderers re-display the same lines frame after frame; caching the
//! visual-order output avoids re-running the full resolution pipeline for
//! repeated strings.
//!
//! # Example
//! ```
//! use bidivis::{ParagraphDirection, ReorderCache};
//!
//! let mut cache = ReorderCache::new(1000);
//!
//! // First call runs the algorithm.
//! let out = cache.get_or_reorder("abc \u{05D0}\u{05D1}", ParagraphDirection::Auto);
//! assert_eq!(out, "abc \u{05D1}\u{05D0}");
//!
//! // Second call hits the cache.
//! let again = cache.get_or_reorder("abc \u{05D0}\u{05D1}", ParagraphDirection::Auto);
//! assert_eq!(again, out);
//!
//! let stats = cache.stats();
//! assert_eq!(stats.hits, 1);
//! assert_eq!(stats.misses, 1);
//! ```

use crate::paragraph::ParagraphDirection;
use crate::reorder::reorder;
use lru::LruCache;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;

/// Default cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Statistics about cache performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Current number of entries.
    pub size: usize,
    /// Maximum capacity.
    pub capacity: usize,
}

impl CacheStats {
    /// Calculate hit rate (0.0 to 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache mapping (text, base direction) to the reordered output.
///
/// # Hash Collisions
/// Keys are stored as 64-bit FxHash values rather than full strings, trading
/// theoretical correctness for memory. With a 64-bit hash the collision
/// probability is negligible for practical workloads.
///
/// # Thread Safety
/// `ReorderCache` is not thread-safe; wrap it in a mutex or keep one per
/// thread.
#[derive(Debug)]
pub struct ReorderCache {
    cache: LruCache<u64, String>,
    hits: u64,
    misses: u64,
}

impl ReorderCache {
    /// Create a new cache with the specified capacity.
    ///
    /// A zero capacity is clamped to 1.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity must be > 0");
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a new cache with the default capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }

    /// Get the cached visual order or run the algorithm and cache it.
    pub fn get_or_reorder(&mut self, text: &str, direction: ParagraphDirection) -> String {
        let key = hash_key(text, direction);
        if let Some(cached) = self.cache.get(&key) {
            self.hits += 1;
            return cached.clone();
        }
        self.misses += 1;
        let out = reorder(text, direction);
        self.cache.put(key, out.clone());
        out
    }

    /// Check if a (text, direction) pair is cached.
    #[must_use]
    pub fn contains(&self, text: &str, direction: ParagraphDirection) -> bool {
        self.cache.contains(&hash_key(text, direction))
    }

    /// Peek at a cached entry without updating LRU order.
    #[must_use]
    pub fn peek(&self, text: &str, direction: ParagraphDirection) -> Option<&str> {
        self.cache
            .peek(&hash_key(text, direction))
            .map(String::as_str)
    }

    /// Clear the cache.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Reset hit/miss statistics.
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }

    /// Get cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.cache.len(),
            capacity: self.cache.cap().get(),
        }
    }

    /// Current number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// The cache capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    /// Resize the capacity, evicting LRU entries as needed.
    pub fn resize(&mut self, new_capacity: usize) {
        let new_capacity = NonZeroUsize::new(new_capacity.max(1)).expect("capacity must be > 0");
        self.cache.resize(new_capacity);
    }
}

impl Default for ReorderCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Hash (text, direction) with FxHash.
#[inline]
fn hash_key(text: &str, direction: ParagraphDirection) -> u64 {
    let mut hasher = FxHasher::default();
    text.hash(&mut hasher);
    let tag: u8 = match direction {
        ParagraphDirection::Auto => 0,
        ParagraphDirection::Ltr => 1,
        ParagraphDirection::Rtl => 2,
    };
    tag.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEB: &str = "\u{05E9}\u{05DC}\u{05D5}\u{05DD}";

    #[test]
    fn cache_hit_returns_same_output() {
        let mut cache = ReorderCache::new(16);
        let first = cache.get_or_reorder(HEB, ParagraphDirection::Auto);
        let second = cache.get_or_reorder(HEB, ParagraphDirection::Auto);
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn cache_matches_direct_reorder() {
        let mut cache = ReorderCache::new(16);
        let cached = cache.get_or_reorder(HEB, ParagraphDirection::Auto);
        assert_eq!(cached, reorder(HEB, ParagraphDirection::Auto));
    }

    #[test]
    fn direction_is_part_of_the_key() {
        let mut cache = ReorderCache::new(16);
        cache.get_or_reorder("abc", ParagraphDirection::Auto);
        assert!(!cache.contains("abc", ParagraphDirection::Rtl));
        cache.get_or_reorder("abc", ParagraphDirection::Rtl);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn peek_does_not_count_as_hit() {
        let mut cache = ReorderCache::new(16);
        cache.get_or_reorder("abc", ParagraphDirection::Auto);
        assert_eq!(cache.peek("abc", ParagraphDirection::Auto), Some("abc"));
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn eviction_respects_capacity() {
        let mut cache = ReorderCache::new(2);
        cache.get_or_reorder("a", ParagraphDirection::Auto);
        cache.get_or_reorder("b", ParagraphDirection::Auto);
        cache.get_or_reorder("c", ParagraphDirection::Auto);
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("a", ParagraphDirection::Auto));
    }

    #[test]
    fn zero_capacity_clamps_to_one() {
        let cache = ReorderCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn resize_evicts_lru_entries() {
        let mut cache = ReorderCache::new(4);
        for text in ["a", "b", "c", "d"] {
            cache.get_or_reorder(text, ParagraphDirection::Auto);
        }
        cache.resize(2);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains("d", ParagraphDirection::Auto));
    }

    #[test]
    fn clear_and_reset_stats() {
        let mut cache = ReorderCache::new(4);
        cache.get_or_reorder("a", ParagraphDirection::Auto);
        cache.clear();
        assert!(cache.is_empty());
        cache.reset_stats();
        assert_eq!(cache.stats(), CacheStats {
            hits: 0,
            misses: 0,
            size: 0,
            capacity: 4
        });
    }

    #[test]
    fn hit_rate_math() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            size: 0,
            capacity: 1,
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
