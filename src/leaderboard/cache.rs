//! Process-wide, time-bounded cache of the top-N leaderboard.
//!
//! Every request handler and the background refresher share one
//! `LeaderboardCache`.  Reads inside the TTL are served from memory without
//! touching the score store; a stale or empty cache is refreshed lazily on
//! read, so correctness never depends on the background task.
//!
//! The cached value is an `Arc<LeaderboardSnapshot>` swapped as a whole under
//! the write lock, so a reader can never observe a half-written ranking.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::models::LeaderboardSnapshot;
use crate::store::{ScoreStore, StoreResult};

#[derive(Clone)]
pub struct LeaderboardCache {
    store: Arc<dyn ScoreStore>,
    limit: usize,
    ttl: Duration,
    inner: Arc<RwLock<CacheEntry>>,
}

#[derive(Default)]
struct CacheEntry {
    snapshot: Option<Arc<LeaderboardSnapshot>>,
    last_refresh: Option<Instant>,
}

impl LeaderboardCache {
    pub fn new(store: Arc<dyn ScoreStore>, limit: usize, ttl: Duration) -> Self {
        LeaderboardCache {
            store,
            limit,
            ttl,
            inner: Arc::new(RwLock::new(CacheEntry::default())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current top-N ranking.
    ///
    /// Fresh cached data is returned as-is. Otherwise the store is queried;
    /// if that fails while an older snapshot exists, the older snapshot is
    /// served instead of an error.
    pub async fn get_snapshot(&self) -> StoreResult<Arc<LeaderboardSnapshot>> {
        {
            let inner = self.inner.read().await;
            if let (Some(snapshot), Some(at)) = (&inner.snapshot, inner.last_refresh) {
                if at.elapsed() < self.ttl {
                    debug!("Serving cached leaderboard ({} entries)", snapshot.len());
                    return Ok(Arc::clone(snapshot));
                }
            }
        }

        debug!("Leaderboard cache stale or empty, refreshing");
        match self.refresh().await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                let previous = self.inner.read().await.snapshot.clone();
                match previous {
                    Some(snapshot) => {
                        warn!(
                            "Leaderboard refresh failed, serving snapshot from {}: {}",
                            snapshot.captured_at, e
                        );
                        Ok(snapshot)
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Fetch the top-N from the store and replace the cached snapshot.
    ///
    /// An empty result is cached like any other. On failure the previous
    /// snapshot and its refresh time stay untouched.
    pub async fn refresh(&self) -> StoreResult<Arc<LeaderboardSnapshot>> {
        let entries = self.store.fetch_top(self.limit).await?;
        let snapshot = Arc::new(LeaderboardSnapshot::new(entries, self.limit, Utc::now()));

        let mut inner = self.inner.write().await;
        inner.snapshot = Some(Arc::clone(&snapshot));
        inner.last_refresh = Some(Instant::now());
        info!(
            "Leaderboard cache updated from {} ({} entries)",
            self.store.name(),
            snapshot.len()
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{player, MemoryStore};

    fn cache_over(store: &Arc<MemoryStore>, limit: usize) -> LeaderboardCache {
        LeaderboardCache::new(store.clone(), limit, Duration::from_secs(15))
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_within_ttl_hit_store_once() {
        let store = Arc::new(MemoryStore::new(vec![player("A", 100), player("B", 90)]));
        let cache = cache_over(&store, 10);

        let first = cache.get_snapshot().await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        let second = cache.get_snapshot().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.calls().0, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_cache_refreshes_on_read() {
        let store = Arc::new(MemoryStore::new(vec![player("A", 100)]));
        let cache = cache_over(&store, 10);

        cache.get_snapshot().await.unwrap();
        store.set_players(vec![player("A", 100), player("B", 150)]);
        tokio::time::advance(Duration::from_secs(16)).await;

        let snapshot = cache.get_snapshot().await.unwrap();
        assert_eq!(store.calls().0, 2);
        assert_eq!(snapshot.entries[0].id, "B");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_result_is_cached() {
        let store = Arc::new(MemoryStore::new(vec![]));
        let cache = cache_over(&store, 10);

        assert!(cache.get_snapshot().await.unwrap().is_empty());
        assert!(cache.get_snapshot().await.unwrap().is_empty());
        assert_eq!(store.calls().0, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let store = Arc::new(MemoryStore::new(vec![player("A", 100), player("B", 90)]));
        let cache = cache_over(&store, 10);

        let before = cache.get_snapshot().await.unwrap();
        store.set_failing(true);
        tokio::time::advance(Duration::from_secs(20)).await;

        assert!(cache.refresh().await.is_err());
        let served = cache.get_snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&before, &served));
        assert_eq!(served.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_retries_on_next_read() {
        let store = Arc::new(MemoryStore::new(vec![player("A", 100)]));
        let cache = cache_over(&store, 10);

        cache.get_snapshot().await.unwrap();
        store.set_failing(true);
        tokio::time::advance(Duration::from_secs(20)).await;
        cache.get_snapshot().await.unwrap();
        cache.get_snapshot().await.unwrap();
        // the failure did not count as a refresh, so each stale read retried
        assert_eq!(store.calls().0, 3);

        store.set_failing(false);
        cache.get_snapshot().await.unwrap();
        cache.get_snapshot().await.unwrap();
        assert_eq!(store.calls().0, 4);
    }

    #[tokio::test]
    async fn test_failure_without_snapshot_is_error() {
        let store = Arc::new(MemoryStore::new(vec![player("A", 1)]));
        store.set_failing(true);
        let cache = cache_over(&store, 10);
        assert!(cache.get_snapshot().await.is_err());
    }

    #[tokio::test]
    async fn test_snapshot_respects_limit_and_order() {
        let players = (0..25).map(|i| player(&i.to_string(), (i * 7 % 13) as u64)).collect();
        let store = Arc::new(MemoryStore::new(players));
        let cache = cache_over(&store, 10);

        let snapshot = cache.get_snapshot().await.unwrap();
        assert!(snapshot.len() <= 10);
        assert!(snapshot
            .entries
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
    }
}
