//! Render cache: memoizes `render(source) -> html` by content fingerprint.
//!
//! Bounded, least-recently-used eviction. A lookup counts as a use, so a
//! frequently re-rendered document survives a stream of one-off contents.
//! The cache is derived state only: dropping it changes timing, never output.

mod hash;

pub use hash::ContentHash;

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use crate::render::{RenderError, Renderer};

/// Capacity used when the configured bound is zero.
pub const DEFAULT_CAPACITY: usize = 32;

/// Hit/miss counters, mostly for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Result of one cache lookup.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub html: Arc<str>,
    pub fingerprint: ContentHash,
    pub cache_hit: bool,
}

/// LRU-bounded memo of a [`Renderer`].
pub struct RenderCache<R> {
    renderer: R,
    entries: LruCache<ContentHash, Arc<str>>,
    stats: CacheStats,
}

impl<R: Renderer> RenderCache<R> {
    /// Create a cache holding at most `capacity` rendered documents.
    pub fn new(renderer: R, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or(NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            renderer,
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Return the cached HTML for `source`, rendering it on a miss.
    ///
    /// Renderer errors are returned unchanged and nothing is stored.
    pub fn get_or_render(&mut self, source: &str) -> Result<Rendered, RenderError> {
        let fingerprint = ContentHash::of(source);

        if let Some(html) = self.entries.get(&fingerprint) {
            self.stats.hits += 1;
            crate::debug!("cache"; "hit {}", fingerprint);
            return Ok(Rendered {
                html: Arc::clone(html),
                fingerprint,
                cache_hit: true,
            });
        }

        self.stats.misses += 1;
        let html: Arc<str> = self.renderer.render(source)?.into();

        if let Some((evicted, _)) = self.entries.push(fingerprint, Arc::clone(&html))
            && evicted != fingerprint
        {
            crate::debug!("cache"; "evicted {}", evicted);
        }
        crate::debug!("cache"; "miss {} ({} cached)", fingerprint, self.entries.len());

        Ok(Rendered {
            html,
            fingerprint,
            cache_hit: false,
        })
    }

    /// Whether `source` is currently cached (does not touch recency).
    pub fn contains(&self, source: &str) -> bool {
        self.entries.contains(&ContentHash::of(source))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drop every entry. Safe at any time.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Renderer that counts invocations and wraps input in `<p>`.
    fn counting() -> (impl Fn(&str) -> Result<String, RenderError>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let renderer = move |source: &str| {
            counter.set(counter.get() + 1);
            Ok(format!("<p>{source}</p>"))
        };
        (renderer, calls)
    }

    #[test]
    fn test_hit_skips_renderer() {
        let (renderer, calls) = counting();
        let mut cache = RenderCache::new(renderer, 4);

        let first = cache.get_or_render("a").unwrap();
        let second = cache.get_or_render("a").unwrap();

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(first.html, second.html);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_evicts_least_recently_accessed() {
        let (renderer, calls) = counting();
        let mut cache = RenderCache::new(renderer, 2);

        cache.get_or_render("a").unwrap();
        cache.get_or_render("b").unwrap();
        // Touch "a" so "b" becomes least recently used, although "a" was inserted first.
        cache.get_or_render("a").unwrap();
        cache.get_or_render("c").unwrap();

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_without_access_oldest_is_evicted() {
        let (renderer, _) = counting();
        let mut cache = RenderCache::new(renderer, 2);

        cache.get_or_render("a").unwrap();
        cache.get_or_render("b").unwrap();
        cache.get_or_render("c").unwrap();

        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn test_error_is_propagated_and_not_cached() {
        let attempts = Cell::new(0);
        let renderer = |source: &str| {
            attempts.set(attempts.get() + 1);
            if attempts.get() == 1 {
                Err(RenderError::new("transform blew up"))
            } else {
                Ok(format!("<p>{source}</p>"))
            }
        };
        let mut cache = RenderCache::new(renderer, 4);

        let err = cache.get_or_render("a").unwrap_err();
        assert_eq!(err, RenderError::new("transform blew up"));
        assert!(cache.is_empty());

        let ok = cache.get_or_render("a").unwrap();
        assert!(!ok.cache_hit);
        assert_eq!(&*ok.html, "<p>a</p>");
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_zero_capacity_falls_back_to_default() {
        let (renderer, _) = counting();
        let cache = RenderCache::new(renderer, 0);
        assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_clear_forces_rerender() {
        let (renderer, calls) = counting();
        let mut cache = RenderCache::new(renderer, 4);

        cache.get_or_render("a").unwrap();
        cache.clear();
        let again = cache.get_or_render("a").unwrap();

        assert!(!again.cache_hit);
        assert_eq!(calls.get(), 2);
    }
}
