//! Tier E: ephemeral, per-generation-run in-memory cache.
//!
//! Double-checked locking: a fast read under a shared lock, and on miss an
//! upgrade to fetch-and-insert, re-checking after acquiring the write lock so
//! a fetch that raced us isn't duplicated. A cached `None` is a valid, stable
//! entry — it means "this key was looked up and the upstream had nothing",
//! and prevents re-issuing a request we already know will come back empty.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use std::future::Future;
use std::hash::Hash;
use tokio::sync::RwLock;

use crate::clients::espn::{EventDoc, GroupDoc, RosterDoc, ScheduleDoc, ScoreboardDoc, TeamDoc};

/// A single memoizing map keyed by `K`, values optional to represent a cached
/// miss. `FxHashMap` since every key here is an internal tuple (league,
/// date, provider id), never attacker-controlled, and this map is read on
/// every enrichment lookup within a run.
pub struct MemoCache<K, V> {
    inner: RwLock<FxHashMap<K, Option<V>>>,
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self { inner: RwLock::new(FxHashMap::default()) }
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value (which may itself be `None`, a known-empty
    /// result) if present, otherwise awaits `fetch` exactly once for this key
    /// even under concurrent callers, then caches and returns its result.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Option<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<V>>,
    {
        {
            let read = self.inner.read().await;
            if let Some(entry) = read.get(&key) {
                return entry.clone();
            }
        }

        let value = fetch().await;

        let mut write = self.inner.write().await;
        // Re-check: another task may have populated this key while we were fetching.
        if let Some(existing) = write.get(&key) {
            return existing.clone();
        }
        write.insert(key, value.clone());
        value
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

/// All Tier E maps for one generation run. Purged (reconstructed) at the
/// start of every run — never reused across runs.
pub struct TierECache {
    pub scoreboard: MemoCache<(String, String, NaiveDate), ScoreboardDoc>,
    pub schedule: MemoCache<(String, String), ScheduleDoc>,
    pub team: MemoCache<(String, String), TeamDoc>,
    pub event: MemoCache<(String, String), EventDoc>,
    pub group: MemoCache<(String, String), GroupDoc>,
    pub roster: MemoCache<(String, String), RosterDoc>,
}

impl TierECache {
    pub fn new() -> Self {
        Self {
            scoreboard: MemoCache::new(),
            schedule: MemoCache::new(),
            team: MemoCache::new(),
            event: MemoCache::new(),
            group: MemoCache::new(),
            roster: MemoCache::new(),
        }
    }
}

impl Default for TierECache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_fetch_runs_once_per_key() {
        let cache: MemoCache<&str, u32> = MemoCache::new();
        let calls = AtomicU32::new(0);

        let a = cache
            .get_or_fetch("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(42)
            })
            .await;
        let b = cache
            .get_or_fetch("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(99)
            })
            .await;

        assert_eq!(a, Some(42));
        assert_eq!(b, Some(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_none_is_stable() {
        let cache: MemoCache<&str, u32> = MemoCache::new();
        let calls = AtomicU32::new(0);

        let a = cache
            .get_or_fetch("missing", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                None
            })
            .await;
        let b = cache
            .get_or_fetch("missing", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(1)
            })
            .await;

        assert_eq!(a, None);
        assert_eq!(b, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_fetch_independently() {
        let cache: MemoCache<&str, u32> = MemoCache::new();
        cache.get_or_fetch("a", || async { Some(1) }).await;
        cache.get_or_fetch("b", || async { Some(2) }).await;
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_clear_empties_cache() {
        let cache: MemoCache<&str, u32> = MemoCache::new();
        cache.get_or_fetch("a", || async { Some(1) }).await;
        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
