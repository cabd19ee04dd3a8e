//! Read-through caching for lookups off the scoring path.
//!
//! ## Features
//!
//! - **Explicit interface**: [`Cache`] is injected, never global
//! - **TTL Support**: every `set` carries its own time-to-live
//! - **LRU Eviction**: least-recently-used entry goes first at capacity
//! - **Decorator**: [`CachedPlayerDirectory`] wraps any `PlayerDirectory`
//!
//! Cache failures never fail the caller: a backend that cannot answer
//! reports a miss.

use crate::metrics::CacheMetrics;
use padelsense_core::notify::{NotifyError, PlayerDirectory, Recipient};
use padelsense_core::types::PlayerId;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Key-value cache with per-entry TTL.
pub trait Cache<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// Value for `key` if present and not expired.
    fn get(&self, key: &str) -> Pin<Box<dyn Future<Output = Option<V>> + Send + '_>>;

    /// Store `value` under `key` for `ttl`.
    fn set(&self, key: String, value: V, ttl: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Drop `key`. Returns whether an entry was removed.
    fn invalidate(&self, key: &str) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;

    /// Drop every key starting with `prefix`. Returns the number removed.
    fn invalidate_prefix(&self, prefix: &str) -> Pin<Box<dyn Future<Output = usize> + Send + '_>>;
}

/// Cached value with timestamps
#[derive(Clone, Debug)]
struct CachedEntry<V> {
    value: V,
    cached_at: Instant,
    ttl: Duration,
    last_accessed: Instant,
}

impl<V> CachedEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            cached_at: now,
            ttl,
            last_accessed: now,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.cached_at) >= self.ttl
    }
}

/// In-process LRU cache with TTL
#[derive(Debug)]
pub struct InMemoryCache<V> {
    /// Maximum entries
    capacity: usize,
    entries: Mutex<HashMap<String, CachedEntry<V>>>,
}

impl<V: Clone> InMemoryCache<V> {
    /// Create new cache holding at most `capacity` entries
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.lock().len(),
            capacity: self.capacity,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock();
        let entry = entries.get_mut(key)?;
        if entry.is_expired(now) {
            entries.remove(key);
            return None;
        }
        entry.last_accessed = now;
        Some(entry.value.clone())
    }

    fn insert(&self, key: String, value: V, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.lock();

        // Evict expired entries
        entries.retain(|_, entry| !entry.is_expired(now));

        // Evict LRU if at capacity
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            if let Some(lru_key) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&lru_key);
            }
        }

        entries.insert(key, CachedEntry::new(value, ttl));
    }
}

impl<V> Cache<V> for InMemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &str) -> Pin<Box<dyn Future<Output = Option<V>> + Send + '_>> {
        let value = self.lookup(key);
        Box::pin(async move { value })
    }

    fn set(&self, key: String, value: V, ttl: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.insert(key, value, ttl);
        Box::pin(async {})
    }

    fn invalidate(&self, key: &str) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        let removed = self.lock().remove(key).is_some();
        Box::pin(async move { removed })
    }

    fn invalidate_prefix(&self, prefix: &str) -> Pin<Box<dyn Future<Output = usize> + Send + '_>> {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        drop(entries);
        Box::pin(async move { removed })
    }
}

/// Cache statistics
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    /// Current size
    pub size: usize,
    /// Maximum capacity
    pub capacity: usize,
}

/// Read-through cache in front of a [`PlayerDirectory`].
///
/// Only resolved recipients are cached; players without one are looked up
/// again next time. Lookup errors pass through uncached.
pub struct CachedPlayerDirectory {
    inner: Arc<dyn PlayerDirectory>,
    cache: Arc<dyn Cache<Recipient>>,
    ttl: Duration,
}

impl CachedPlayerDirectory {
    /// Wrap `inner`, keeping hits for `ttl`.
    #[must_use]
    pub fn new(inner: Arc<dyn PlayerDirectory>, cache: Arc<dyn Cache<Recipient>>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    /// Cache key for a player's recipient
    #[must_use]
    pub fn key(player: PlayerId) -> String {
        format!("player:{player}:recipient")
    }

    /// Forget a player's cached recipient.
    pub async fn forget(&self, player: PlayerId) -> bool {
        self.cache.invalidate(&Self::key(player)).await
    }
}

impl PlayerDirectory for CachedPlayerDirectory {
    fn recipient(
        &self,
        player: PlayerId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Recipient>, NotifyError>> + Send + '_>> {
        Box::pin(async move {
            let key = Self::key(player);
            if let Some(hit) = self.cache.get(&key).await {
                CacheMetrics::record_hit();
                tracing::debug!(key = %key, "Cache hit");
                return Ok(Some(hit));
            }
            CacheMetrics::record_miss();

            let found = self.inner.recipient(player).await?;
            if let Some(recipient) = found {
                self.cache.set(key, recipient, self.ttl).await;
            }
            Ok(found)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use padelsense_testing::StaticDirectory;

    #[tokio::test]
    async fn test_cache_basic() {
        let cache = InMemoryCache::new(2);

        cache.set("key1".to_string(), 1_i64, Duration::from_secs(60)).await;
        assert_eq!(cache.get("key1").await, Some(1));
        assert_eq!(cache.get("missing").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_huge_ttl_never_expires() {
        let cache = InMemoryCache::new(4);

        cache.set("key".to_string(), 1_i64, Duration::from_secs(u64::MAX)).await;
        tokio::time::advance(Duration::from_secs(365 * 24 * 3600)).await;

        assert_eq!(cache.get("key").await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_lru_eviction() {
        let cache = InMemoryCache::new(2);
        let ttl = Duration::from_secs(60);

        cache.set("key1".to_string(), 1_i64, ttl).await;
        tokio::time::advance(Duration::from_millis(2)).await;
        cache.set("key2".to_string(), 2, ttl).await;
        tokio::time::advance(Duration::from_millis(2)).await;

        // Access key1 to make it more recent
        let _ = cache.get("key1").await;

        // Insert key3, should evict key2 (LRU)
        cache.set("key3".to_string(), 3, ttl).await;

        assert!(cache.get("key1").await.is_some());
        assert!(cache.get("key2").await.is_none());
        assert!(cache.get("key3").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_ttl() {
        let cache = InMemoryCache::new(10);

        cache.set("key1".to_string(), 1_i64, Duration::from_millis(50)).await;
        assert!(cache.get("key1").await.is_some());

        // Wait for expiration
        tokio::time::advance(Duration::from_millis(60)).await;

        assert!(cache.get("key1").await.is_none());
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = InMemoryCache::new(5);
        let ttl = Duration::from_secs(60);
        cache.set("player:1:recipient".to_string(), 1_i64, ttl).await;
        cache.set("player:2:recipient".to_string(), 2, ttl).await;
        cache.set("court:1".to_string(), 3, ttl).await;

        assert!(cache.invalidate("court:1").await);
        assert!(!cache.invalidate("court:1").await);
        assert_eq!(cache.invalidate_prefix("player:").await, 2);
        assert_eq!(
            cache.stats(),
            CacheStats {
                size: 0,
                capacity: 5
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cached_directory_hits_inner_once_per_ttl() {
        let player = PlayerId::new();
        let inner = StaticDirectory::new([(player, Recipient::new(1001))]);
        let directory = CachedPlayerDirectory::new(
            Arc::new(inner.clone()),
            Arc::new(InMemoryCache::new(16)),
            Duration::from_secs(3600),
        );

        for _ in 0..3 {
            let found = directory.recipient(player).await.unwrap();
            assert_eq!(found, Some(Recipient::new(1001)));
        }
        assert_eq!(inner.lookups(), 1);

        tokio::time::advance(Duration::from_secs(3601)).await;
        directory.recipient(player).await.unwrap();
        assert_eq!(inner.lookups(), 2);

        assert!(directory.forget(player).await);
        directory.recipient(player).await.unwrap();
        assert_eq!(inner.lookups(), 3);
    }

    #[tokio::test]
    async fn unknown_players_are_not_cached() {
        let inner = StaticDirectory::new([]);
        let directory = CachedPlayerDirectory::new(
            Arc::new(inner.clone()),
            Arc::new(InMemoryCache::new(16)),
            Duration::from_secs(3600),
        );

        let stranger = PlayerId::new();
        assert_eq!(directory.recipient(stranger).await.unwrap(), None);
        assert_eq!(directory.recipient(stranger).await.unwrap(), None);
        assert_eq!(inner.lookups(), 2);
    }
}
