//! In-memory result cache with expiration and per-key single-flight.
//!
//! [`ResultCache`] is the storage seam: `get` and `set` with a time-to-live.
//! [`MemoryCache`] implements it over an LRU map. [`SharedCache`] wraps any
//! store together with per-key locks so concurrent readers of the same feed
//! configuration perform one fetch between them.
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;

use crate::feed::Article;

/// Default freshness window for a cached feed result (24 hours).
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cached value: the full ordered article list of one feed read.
pub type CachedArticles = Arc<Vec<Article>>;

/// Key/value store with per-entry expiration.
pub trait ResultCache: Send + Sync {
    /// Returns the entry under `key` if present and not expired.
    fn get(&self, key: &str) -> Option<CachedArticles>;

    /// Stores `value` under `key`, replacing any previous entry.
    fn set(&self, key: &str, value: CachedArticles, ttl: Duration);
}

struct CacheEntry {
    articles: CachedArticles,
    expires_at: Instant,
}

/// Bounded in-memory [`ResultCache`].
///
/// Least recently used entries are evicted once `capacity` is reached;
/// expired entries are dropped lazily on lookup. Expiry uses the tokio
/// clock, so paused-time tests can advance past a TTL.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        // A panic while holding the lock cannot leave an entry half-written
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &str) -> Option<CachedArticles> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(Arc::clone(&entry.articles));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            tracing::debug!(key = %key, "Cache entry expired");
            entries.pop(key);
        }
        None
    }

    fn set(&self, key: &str, value: CachedArticles, ttl: Duration) {
        let entry = CacheEntry {
            articles: value,
            expires_at: Instant::now() + ttl,
        };
        if let Some((evicted, _)) = self.lock().push(key.to_string(), entry) {
            if evicted != key {
                tracing::debug!(key = %evicted, "Evicted least recently used cache entry");
            }
        }
    }
}

type FlightMap = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

/// A cache store plus the per-key locks that make misses single-flight.
///
/// Cloning is cheap and clones share both the store and the locks, so
/// readers handed the same `SharedCache` coalesce their fetches.
#[derive(Clone)]
pub struct SharedCache {
    store: Arc<dyn ResultCache>,
    flights: FlightMap,
}

impl std::fmt::Debug for SharedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCache")
            .field("in_flight", &lock_flights(&self.flights).len())
            .finish_non_exhaustive()
    }
}

impl SharedCache {
    pub fn new(store: Arc<dyn ResultCache>) -> Self {
        Self {
            store,
            flights: Arc::default(),
        }
    }

    /// A fresh [`MemoryCache`] holding up to `capacity` results.
    pub fn in_memory(capacity: usize) -> Self {
        Self::new(Arc::new(MemoryCache::new(capacity)))
    }

    pub fn get(&self, key: &str) -> Option<CachedArticles> {
        self.store.get(key)
    }

    pub fn set(&self, key: &str, value: CachedArticles, ttl: Duration) {
        self.store.set(key, value, ttl);
    }

    /// Waits for exclusive use of `key`.
    ///
    /// The holder of the returned guard is the only caller fetching `key`.
    /// Others wait here and should re-check the cache once they get in.
    pub async fn lock_key(&self, key: &str) -> FlightGuard {
        let lock = {
            let mut flights = lock_flights(&self.flights);
            Arc::clone(flights.entry(key.to_string()).or_default())
        };
        let guard = lock.lock_owned().await;
        FlightGuard {
            key: key.to_string(),
            flights: Arc::clone(&self.flights),
            _guard: guard,
        }
    }

    /// Number of keys with a fetch in progress or queued.
    pub fn in_flight(&self) -> usize {
        lock_flights(&self.flights).len()
    }
}

fn lock_flights(
    flights: &FlightMap,
) -> MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
    flights.lock().unwrap_or_else(|e| e.into_inner())
}

/// Exclusive claim on one cache key. Released on drop.
pub struct FlightGuard {
    key: String,
    flights: FlightMap,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let mut flights = lock_flights(&self.flights);
        // Map + our guard hold two references; more means someone is queued.
        let idle = flights
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) <= 2);
        if idle {
            flights.remove(&self.key);
        }
    }
}
