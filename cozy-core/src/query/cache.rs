use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::key::{KeyPattern, QueryKey};
use crate::config::CacheConfig;
use crate::error::CozyResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub stale_time: Duration,
    pub gc_time: Duration,
    /// Extra attempts after a retryable read failure.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        CachePolicy {
            stale_time: config.stale_time,
            gc_time: config.gc_time,
            retries: config.query_retries,
            retry_delay: config.retry_delay,
        }
    }
}

struct SlotState {
    value: Option<Arc<dyn Any + Send + Sync>>,
    fetched_at: Option<Instant>,
    last_access: Instant,
    /// Last generation handed out to a fetch or a `set`.
    started: u64,
    /// Generation of the value currently stored.
    written: u64,
    /// Values from generations up to this one are stale.
    stale_through: u64,
}

struct Slot {
    /// Held for the whole duration of a fetch: one request per key at a time.
    inflight: tokio::sync::Mutex<()>,
    state: parking_lot::Mutex<SlotState>,
}

impl Slot {
    fn new() -> Self {
        Slot {
            inflight: tokio::sync::Mutex::new(()),
            state: parking_lot::Mutex::new(SlotState {
                value: None,
                fetched_at: None,
                last_access: Instant::now(),
                started: 0,
                written: 0,
                stale_through: 0,
            }),
        }
    }
}

impl SlotState {
    fn next_generation(&mut self) -> u64 {
        self.started += 1;
        self.started
    }

    /// Store `value` unless something newer already landed.
    fn write(&mut self, generation: u64, value: Arc<dyn Any + Send + Sync>) -> bool {
        if generation <= self.written {
            return false;
        }
        self.value = Some(value);
        self.fetched_at = Some(Instant::now());
        self.written = generation;
        true
    }

    fn is_stale(&self, stale_time: Duration) -> bool {
        match self.fetched_at {
            Some(fetched_at) => {
                self.written <= self.stale_through || fetched_at.elapsed() >= stale_time
            }
            None => true,
        }
    }

    fn read<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        let value = Arc::clone(self.value.as_ref()?);
        value.downcast::<T>().ok().map(|v| (*v).clone())
    }
}

/// Shared, cloneable handle to the query cache.
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<DashMap<QueryKey, Arc<Slot>>>,
    policy: CachePolicy,
}

impl Default for QueryCache {
    fn default() -> Self {
        QueryCache::new(CachePolicy::default())
    }
}

impl QueryCache {
    pub fn new(policy: CachePolicy) -> Self {
        QueryCache {
            entries: Arc::new(DashMap::new()),
            policy,
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    fn slot(&self, key: &QueryKey) -> Arc<Slot> {
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Slot::new()));
        Arc::clone(entry.value())
    }

    fn fresh<T: Clone + Send + Sync + 'static>(&self, slot: &Slot) -> Option<T> {
        let mut state = slot.state.lock();
        state.last_access = Instant::now();
        if state.is_stale(self.policy.stale_time) {
            return None;
        }
        state.read()
    }

    /// Return the cached value for `key` if fresh; otherwise run `fetcher`.
    ///
    /// Concurrent callers for the same key wait for the request already in
    /// flight and reuse its result. Retryable failures are retried up to
    /// the policy's limit. A failed fetch keeps whatever value was cached
    /// before.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> CozyResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = CozyResult<T>>,
    {
        loop {
            let slot = self.slot(&key);

            if let Some(value) = self.fresh(&slot) {
                debug!(%key, "cache hit");
                return Ok(value);
            }

            let _inflight = slot.inflight.lock().await;

            // `gc` or `clear` may have dropped the slot while we waited. A
            // value written into a detached slot is invisible to later callers.
            if !self.is_current(&key, &slot) {
                debug!(%key, "slot evicted while waiting, retrying");
                continue;
            }

            // Whoever held the lock before us may have just filled the slot.
            if let Some(value) = self.fresh(&slot) {
                debug!(%key, "cache hit after waiting on in-flight fetch");
                return Ok(value);
            }

            let generation = slot.state.lock().next_generation();
            debug!(%key, generation, "cache miss, fetching");

            let value = self.fetch_with_retries(&key, &fetcher).await?;

            let written = slot.state.lock().write(generation, Arc::new(value.clone()));
            if !written {
                debug!(%key, generation, "fetch superseded by newer data");
            }

            return Ok(value);
        }
    }

    fn is_current(&self, key: &QueryKey, slot: &Arc<Slot>) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), slot))
    }

    async fn fetch_with_retries<T, F, Fut>(&self, key: &QueryKey, fetcher: &F) -> CozyResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = CozyResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match fetcher().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.policy.retries => {
                    attempt += 1;
                    warn!(%key, attempt, error = %err, "query failed, retrying");
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Cached value regardless of staleness.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &QueryKey) -> Option<T> {
        let slot = self.entries.get(key).map(|entry| Arc::clone(entry.value()))?;
        let mut state = slot.state.lock();
        state.last_access = Instant::now();
        state.read()
    }

    /// Absent keys count as stale.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        match self.entries.get(key) {
            Some(entry) => entry.value().state.lock().is_stale(self.policy.stale_time),
            None => true,
        }
    }

    /// Seed a key with a value obtained elsewhere (e.g. the user returned by login).
    pub fn set<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        let slot = self.slot(&key);
        let mut state = slot.state.lock();
        let generation = state.next_generation();
        state.write(generation, Arc::new(value));
        state.last_access = Instant::now();
    }

    /// Mark every matching entry stale, including results of fetches still
    /// in flight. Returns the number of entries marked.
    pub fn invalidate(&self, pattern: &KeyPattern) -> usize {
        let mut marked = 0;
        for entry in self.entries.iter() {
            if !pattern.matches(entry.key()) {
                continue;
            }
            let mut state = entry.value().state.lock();
            state.stale_through = state.started;
            marked += 1;
        }

        debug!(?pattern, marked, "invalidated queries");
        marked
    }

    /// Evict idle entries. Entries with a fetch in flight are kept.
    pub fn gc(&self) -> usize {
        let before = self.entries.len();
        let gc_time = self.policy.gc_time;

        self.entries.retain(|_, slot| {
            slot.inflight.try_lock().is_err() || slot.state.lock().last_access.elapsed() < gc_time
        });

        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            debug!(evicted, "evicted idle queries");
        }
        evicted
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CozyError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy() -> CachePolicy {
        CachePolicy {
            stale_time: Duration::from_secs(30),
            gc_time: Duration::from_secs(300),
            retries: 3,
            retry_delay: Duration::from_millis(100),
        }
    }

    fn counting(
        calls: &Arc<AtomicUsize>,
        value: i64,
    ) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = CozyResult<Vec<i64>>> + Send>> {
        let calls = Arc::clone(calls);
        move || {
            let calls = Arc::clone(&calls);
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(vec![value])
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_values_are_served_from_cache() {
        let cache = QueryCache::new(policy());
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.fetch(QueryKey::Projects, counting(&calls, 1)).await.unwrap();
        let second = cache.fetch(QueryKey::Projects, counting(&calls, 2)).await.unwrap();

        assert_eq!(first, vec![1]);
        assert_eq!(second, vec![1]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(cache.is_stale(&QueryKey::Projects));
        let third = cache.fetch(QueryKey::Projects, counting(&calls, 3)).await.unwrap();
        assert_eq!(third, vec![3]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_fetches_share_one_request() {
        let cache = QueryCache::new(policy());
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.fetch(QueryKey::Calendars, counting(&calls, 1)),
            cache.fetch(QueryKey::Calendars, counting(&calls, 2)),
        );

        assert_eq!(a.unwrap(), vec![1]);
        assert_eq!(b.unwrap(), vec![1]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_forces_refetch() {
        let cache = QueryCache::new(policy());
        let calls = Arc::new(AtomicUsize::new(0));

        cache.fetch(QueryKey::Tasks(1), counting(&calls, 1)).await.unwrap();
        cache.fetch(QueryKey::Tasks(2), counting(&calls, 1)).await.unwrap();

        assert_eq!(cache.invalidate(&QueryKey::Tasks(1).into()), 1);
        assert!(cache.is_stale(&QueryKey::Tasks(1)));
        assert!(!cache.is_stale(&QueryKey::Tasks(2)));

        // Stale data stays readable until the refetch lands.
        assert_eq!(cache.get::<Vec<i64>>(&QueryKey::Tasks(1)), Some(vec![1]));

        let refetched = cache.fetch(QueryKey::Tasks(1), counting(&calls, 9)).await.unwrap();
        assert_eq!(refetched, vec![9]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_during_fetch_keeps_result_stale() {
        let cache = QueryCache::new(policy());
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = cache.fetch(QueryKey::Tasks(3), counting(&calls, 1));
        let invalidate = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cache.invalidate(&KeyPattern::Exact(QueryKey::Tasks(3)))
        };
        let (value, marked) = tokio::join!(fetch, invalidate);

        assert_eq!(value.unwrap(), vec![1]);
        assert_eq!(marked, 1);
        assert!(cache.is_stale(&QueryKey::Tasks(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_fetch_survives_a_cleared_cache() {
        let cache = QueryCache::new(policy());
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.fetch(QueryKey::Projects, counting(&calls, 1));
        let waiting = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cache.fetch(QueryKey::Projects, counting(&calls, 2)).await
        };
        let clear = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cache.clear();
        };
        let (first, waiting, ()) = tokio::join!(first, waiting, clear);

        assert_eq!(first.unwrap(), vec![1]);
        // The first result went into an evicted slot, so the waiter refetched.
        assert_eq!(waiting.unwrap(), vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get::<Vec<i64>>(&QueryKey::Projects), Some(vec![2]));
    }

    #[tokio::test(start_paused = true)]
    async fn newer_value_supersedes_in_flight_fetch() {
        let cache = QueryCache::new(policy());
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = cache.fetch(QueryKey::Me, counting(&calls, 1));
        let seed = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cache.set(QueryKey::Me, vec![2_i64]);
        };
        let (fetched, ()) = tokio::join!(fetch, seed);

        assert_eq!(fetched.unwrap(), vec![1]);
        assert_eq!(cache.get::<Vec<i64>>(&QueryKey::Me), Some(vec![2]));
    }

    #[tokio::test(start_paused = true)]
    async fn reads_retry_server_errors_only() {
        let cache = QueryCache::new(policy());
        let calls = Arc::new(AtomicUsize::new(0));

        let flaky = {
            let calls = Arc::clone(&calls);
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(CozyError::Http { status: 502, message: "Bad Gateway".into() })
                    } else {
                        Ok(7_i64)
                    }
                }
            }
        };
        assert_eq!(cache.fetch(QueryKey::Projects, flaky).await.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        calls.store(0, Ordering::SeqCst);
        let missing = {
            let calls = Arc::clone(&calls);
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<i64, _>(CozyError::Http { status: 404, message: "not found".into() })
                }
            }
        };
        let err = cache.fetch(QueryKey::Tasks(5), missing).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded() {
        let cache = QueryCache::new(policy());
        let calls = Arc::new(AtomicUsize::new(0));

        let down = {
            let calls = Arc::clone(&calls);
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<i64, _>(CozyError::Transport("connection refused".into()))
                }
            }
        };
        assert!(cache.fetch(QueryKey::Calendars, down).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn gc_evicts_idle_entries() {
        let cache = QueryCache::new(policy());
        cache.set(QueryKey::Projects, 1_i64);
        cache.set(QueryKey::Calendars, 2_i64);

        tokio::time::advance(Duration::from_secs(200)).await;
        assert_eq!(cache.get::<i64>(&QueryKey::Calendars), Some(2));

        tokio::time::advance(Duration::from_secs(200)).await;
        assert_eq!(cache.gc(), 1);
        assert_eq!(cache.get::<i64>(&QueryKey::Projects), None);
        assert_eq!(cache.len(), 1);
    }
}
