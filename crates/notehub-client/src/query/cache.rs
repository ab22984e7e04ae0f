//! Key-addressed query cache with request deduplication.
//!
//! `QueryClient` owns every cached result. Values of different types share
//! one map, stored as `Arc<dyn Any>` and read back through typed accessors.
//!
//! ## Fetch lifecycle
//!
//! - A fetch for a key runs as its own tokio task and is shared between all
//!   callers interested in that key while it is in flight.
//! - Dropping every interested caller does not cancel the task; the result
//!   still lands in the cache.
//! - Invalidation bumps the entry generation. A fetch that settles under an
//!   older generation stores its data but leaves the entry stale, and
//!   observed entries are fetched again.
//! - A fetch whose entry was removed is discarded, even if the key has been
//!   cached again since.
//!
//! ## Example
//!
//! ```rust,ignore
//! let client = QueryClient::new();
//! let key = QueryKey::new("note").with("abc");
//! let note: Arc<Note> = client
//!     .fetch_query(&key, QueryFn::new(move || fetch_note("abc")))
//!     .await?;
//! client.invalidate_queries(&QueryFilter::namespace("notes"));
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::key::{QueryFilter, QueryKey};
use super::observer::QueryObserver;
use crate::config::{ClientConfig, DEFAULT_GC_SECS, DEFAULT_STALE_SECS};
use crate::error::{ClientError, ClientResult};

/// Values that can be cached: shareable across tasks and serializable for
/// dehydration.
pub trait QueryData: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> QueryData for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

pub(crate) type AnyData = Arc<dyn Any + Send + Sync>;
pub(crate) type FetchResult = Result<AnyData, Arc<ClientError>>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;
type Encoder = fn(&AnyData) -> Option<serde_json::Value>;

/// Data restored by `hydrate`, decoded lazily on first typed access.
struct Hydrated(serde_json::Value);

fn encode_as<T: QueryData>(data: &AnyData) -> Option<serde_json::Value> {
    if let Some(hydrated) = data.downcast_ref::<Hydrated>() {
        return Some(hydrated.0.clone());
    }
    data.downcast_ref::<T>()
        .and_then(|value| serde_json::to_value(value).ok())
}

pub(crate) fn decode<T: QueryData>(data: &AnyData) -> Option<Arc<T>> {
    if let Ok(typed) = Arc::clone(data).downcast::<T>() {
        return Some(typed);
    }
    let hydrated = data.downcast_ref::<Hydrated>()?;
    serde_json::from_value(hydrated.0.clone()).ok().map(Arc::new)
}

/// The function that produces the value of a key.
///
/// Stored with the entry so invalidation can re-run it without the caller.
#[derive(Clone)]
pub struct QueryFn {
    run: Arc<dyn Fn() -> BoxFuture<'static, FetchResult> + Send + Sync>,
    encode: Encoder,
}

impl QueryFn {
    pub fn new<T, F, Fut>(f: F) -> Self
    where
        T: QueryData,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        Self {
            run: Arc::new(move || {
                f().map(|result| match result {
                    Ok(value) => Ok(Arc::new(value) as AnyData),
                    Err(e) => Err(Arc::new(e)),
                })
                .boxed()
            }),
            encode: encode_as::<T>,
        }
    }

    fn call(&self) -> BoxFuture<'static, FetchResult> {
        (self.run)()
    }
}

impl std::fmt::Debug for QueryFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryFn").finish_non_exhaustive()
    }
}

/// Lifecycle status of a cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// No data and no error yet.
    Pending,
    /// The last fetch failed.
    Error,
    /// Data is available.
    Success,
}

/// What observers see of an entry.
#[derive(Clone)]
pub(crate) struct Snapshot {
    pub(crate) data: Option<AnyData>,
    pub(crate) error: Option<Arc<ClientError>>,
    pub(crate) status: QueryStatus,
    pub(crate) is_fetching: bool,
    pub(crate) is_invalidated: bool,
    pub(crate) data_updated_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    fn pending() -> Self {
        Self {
            data: None,
            error: None,
            status: QueryStatus::Pending,
            is_fetching: false,
            is_invalidated: false,
            data_updated_at: None,
        }
    }
}

struct CacheEntry {
    state: watch::Sender<Snapshot>,
    in_flight: Option<SharedFetch>,
    query_fn: Option<QueryFn>,
    encode: Option<Encoder>,
    generation: u64,
    /// Generation the entry was created with. Older fetches belong to an
    /// entry that was removed.
    born: u64,
    observers: usize,
    fetched_at: Option<Instant>,
    last_used: Instant,
}

impl CacheEntry {
    fn new(generation: u64) -> Self {
        let (state, _) = watch::channel(Snapshot::pending());
        Self {
            state,
            in_flight: None,
            query_fn: None,
            encode: None,
            generation,
            born: generation,
            observers: 0,
            fetched_at: None,
            last_used: Instant::now(),
        }
    }

    fn data(&self) -> Option<AnyData> {
        self.state.borrow().data.clone()
    }

    fn is_fresh(&self, stale_time: Duration) -> bool {
        let state = self.state.borrow();
        state.data.is_some()
            && !state.is_invalidated
            && self
                .fetched_at
                .is_some_and(|at| at.elapsed() < stale_time)
    }

    fn set_query_fn(&mut self, query_fn: QueryFn) {
        self.encode = Some(query_fn.encode);
        self.query_fn = Some(query_fn);
    }

    fn store_data(&mut self, data: AnyData, updated_at: DateTime<Utc>) {
        self.fetched_at = Some(Instant::now());
        self.state.send_modify(|s| {
            s.data = Some(data);
            s.error = None;
            s.status = QueryStatus::Success;
            s.is_invalidated = false;
            s.data_updated_at = Some(updated_at);
        });
    }

    /// Replaces hydrated JSON with the typed value, so later reads skip
    /// deserialization.
    fn upgrade<T: QueryData>(&mut self) {
        let Some(data) = self.data() else { return };
        if data.downcast_ref::<Hydrated>().is_none() {
            return;
        }
        if let Some(typed) = decode::<T>(&data) {
            self.encode = Some(encode_as::<T>);
            self.state.send_if_modified(|s| {
                s.data = Some(typed as AnyData);
                false
            });
        }
    }
}

/// Cache timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// How long fetched data counts as fresh.
    pub stale_time: Duration,
    /// How long an unobserved entry is kept before collection.
    pub gc_time: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(DEFAULT_STALE_SECS),
            gc_time: Duration::from_secs(DEFAULT_GC_SECS),
        }
    }
}

impl From<&ClientConfig> for QueryConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            stale_time: config.stale_time,
            gc_time: config.gc_time,
        }
    }
}

/// Counters describing cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Fetch tasks spawned.
    pub fetches_started: u64,
    /// Requests that joined a fetch already in flight.
    pub fetches_deduped: u64,
    /// Fetch tasks that ended in an error.
    pub fetches_failed: u64,
    /// Entries marked stale by invalidation.
    pub invalidations: u64,
    /// Entries removed by garbage collection.
    pub entries_collected: u64,
}

#[derive(Default)]
struct Counters {
    fetches_started: AtomicU64,
    fetches_deduped: AtomicU64,
    fetches_failed: AtomicU64,
    invalidations: AtomicU64,
    entries_collected: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    config: QueryConfig,
    counters: Counters,
    /// Source of entry generations. Shared by all keys so a re-created
    /// entry never reuses a generation of the entry it replaces.
    generations: AtomicU64,
}

/// Process-wide query cache.
///
/// Cloning is cheap and clones share the same cache.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("config", &self.inner.config)
            .field("entries", &self.len())
            .finish()
    }
}

impl QueryClient {
    /// Creates a cache with default timing.
    pub fn new() -> Self {
        Self::with_config(QueryConfig::default())
    }

    /// Creates a cache with custom timing.
    pub fn with_config(config: QueryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                config,
                counters: Counters::default(),
                generations: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.inner.config
    }

    /// Returns a snapshot of the activity counters.
    pub fn stats(&self) -> QueryStats {
        let c = &self.inner.counters;
        QueryStats {
            fetches_started: c.fetches_started.load(Ordering::Relaxed),
            fetches_deduped: c.fetches_deduped.load(Ordering::Relaxed),
            fetches_failed: c.fetches_failed.load(Ordering::Relaxed),
            invalidations: c.invalidations.load(Ordering::Relaxed),
            entries_collected: c.entries_collected.load(Ordering::Relaxed),
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------------
    // Fetching
    // ------------------------------------------------------------------------

    /// Returns the value of a key, fetching it unless fresh data is cached.
    ///
    /// Concurrent calls for the same key share one fetch.
    pub async fn fetch_query<T: QueryData>(
        &self,
        key: &QueryKey,
        query_fn: QueryFn,
    ) -> Result<Arc<T>, Arc<ClientError>> {
        let fetch = {
            let mut entries = self.entries();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(self.next_generation()));
            entry.last_used = Instant::now();
            entry.set_query_fn(query_fn.clone());

            if entry.is_fresh(self.inner.config.stale_time) {
                entry.upgrade::<T>();
                let data = entry.data();
                drop(entries);
                debug!(key = %key, "cache hit");
                return data
                    .as_ref()
                    .and_then(decode::<T>)
                    .ok_or_else(|| Arc::new(type_error(key)));
            }

            self.join_or_start(key, entry, query_fn)
        };

        let data = fetch.await?;
        decode::<T>(&data).ok_or_else(|| Arc::new(type_error(key)))
    }

    /// Fetches a key and discards the outcome. Errors are logged, never
    /// returned.
    pub async fn prefetch_query<T: QueryData>(&self, key: &QueryKey, query_fn: QueryFn) {
        if let Err(error) = self.fetch_query::<T>(key, query_fn).await {
            warn!(key = %key, error = %error, "prefetch failed");
        }
    }

    /// Subscribes to a key, fetching it unless fresh data is cached.
    pub fn observe<T: QueryData>(&self, key: QueryKey, query_fn: QueryFn) -> QueryObserver<T> {
        let receiver = self.subscribe::<T>(&key, query_fn);
        QueryObserver::new(self.clone(), key, receiver)
    }

    /// Re-runs the stored query function of a key, or joins its in-flight
    /// fetch. Returns false if the key has no query function.
    pub fn refetch(&self, key: &QueryKey) -> bool {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(key) else {
            return false;
        };
        match entry.query_fn.clone() {
            Some(query_fn) => {
                self.join_or_start(key, entry, query_fn);
                true
            }
            None => false,
        }
    }

    pub(crate) fn subscribe<T: QueryData>(
        &self,
        key: &QueryKey,
        query_fn: QueryFn,
    ) -> watch::Receiver<Snapshot> {
        let mut entries = self.entries();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(self.next_generation()));
        entry.observers += 1;
        entry.last_used = Instant::now();
        entry.set_query_fn(query_fn.clone());
        entry.upgrade::<T>();

        if !entry.is_fresh(self.inner.config.stale_time) {
            self.join_or_start(key, entry, query_fn);
        }

        entry.state.subscribe()
    }

    pub(crate) fn unsubscribe(&self, key: &QueryKey) {
        if let Some(entry) = self.entries().get_mut(key) {
            entry.observers = entry.observers.saturating_sub(1);
            entry.last_used = Instant::now();
        }
    }

    fn join_or_start(
        &self,
        key: &QueryKey,
        entry: &mut CacheEntry,
        query_fn: QueryFn,
    ) -> SharedFetch {
        if let Some(in_flight) = &entry.in_flight {
            Counters::bump(&self.inner.counters.fetches_deduped, 1);
            debug!(key = %key, "joining in-flight fetch");
            return in_flight.clone();
        }
        self.start_fetch(key, entry, query_fn)
    }

    fn next_generation(&self) -> u64 {
        self.inner.generations.fetch_add(1, Ordering::Relaxed)
    }

    fn start_fetch(&self, key: &QueryKey, entry: &mut CacheEntry, query_fn: QueryFn) -> SharedFetch {
        let generation = entry.generation;
        let client = self.clone();
        let task_key = key.clone();
        let fetch = query_fn.call();

        let task = tokio::spawn(async move {
            let result = match AssertUnwindSafe(fetch).catch_unwind().await {
                Ok(result) => result,
                Err(_) => Err(Arc::new(ClientError::Task(
                    "query function panicked".to_string(),
                ))),
            };
            client.settle(&task_key, generation, &result);
            result
        });

        let shared = async move {
            task.await
                .unwrap_or_else(|e| Err(Arc::new(ClientError::Task(e.to_string()))))
        }
        .boxed()
        .shared();

        entry.in_flight = Some(shared.clone());
        entry.state.send_modify(|s| s.is_fetching = true);
        Counters::bump(&self.inner.counters.fetches_started, 1);
        debug!(key = %key, generation, "fetch started");

        shared
    }

    fn settle(&self, key: &QueryKey, generation: u64, result: &FetchResult) {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(key) else {
            debug!(key = %key, "fetch settled for a removed entry");
            return;
        };
        if generation < entry.born {
            debug!(key = %key, "fetch settled for a replaced entry");
            return;
        }

        entry.in_flight = None;
        let superseded = entry.generation != generation;

        match result {
            Ok(data) => {
                entry.fetched_at = Some(Instant::now());
                entry.state.send_modify(|s| {
                    s.data = Some(Arc::clone(data));
                    s.error = None;
                    s.status = QueryStatus::Success;
                    s.data_updated_at = Some(Utc::now());
                    s.is_fetching = false;
                    s.is_invalidated = superseded;
                });
                debug!(key = %key, superseded, "fetch succeeded");
            }
            Err(error) => {
                Counters::bump(&self.inner.counters.fetches_failed, 1);
                entry.state.send_modify(|s| {
                    s.error = Some(Arc::clone(error));
                    s.status = QueryStatus::Error;
                    s.is_fetching = false;
                    s.is_invalidated = superseded;
                });
                warn!(key = %key, error = %error, "fetch failed");
            }
        }

        if superseded && entry.observers > 0 {
            if let Some(query_fn) = entry.query_fn.clone() {
                debug!(key = %key, "refetching entry invalidated mid-flight");
                self.start_fetch(key, entry, query_fn);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Invalidation and direct access
    // ------------------------------------------------------------------------

    /// Marks matching entries stale and re-fetches the observed ones.
    ///
    /// Returns the number of entries invalidated.
    pub fn invalidate_queries(&self, filter: &QueryFilter) -> usize {
        let mut entries = self.entries();
        let mut count = 0;
        let mut refetched = 0;

        for (key, entry) in entries.iter_mut().filter(|(key, _)| filter.matches(key)) {
            count += 1;
            entry.generation = self.next_generation();
            entry.state.send_modify(|s| s.is_invalidated = true);

            if entry.observers > 0 && entry.in_flight.is_none() {
                if let Some(query_fn) = entry.query_fn.clone() {
                    self.start_fetch(key, entry, query_fn);
                    refetched += 1;
                }
            }
        }

        Counters::bump(&self.inner.counters.invalidations, count as u64);
        info!(filter = ?filter, count, refetched, "invalidated queries");
        count
    }

    /// Returns the cached value of a key, fresh or not.
    pub fn get_query_data<T: QueryData>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let mut entries = self.entries();
        let entry = entries.get_mut(key)?;
        entry.upgrade::<T>();
        entry.data().as_ref().and_then(decode::<T>)
    }

    /// Stores a value for a key as if it had just been fetched.
    pub fn set_query_data<T: QueryData>(&self, key: &QueryKey, value: T) {
        let mut entries = self.entries();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(self.next_generation()));
        entry.encode = Some(encode_as::<T>);
        entry.last_used = Instant::now();
        entry.store_data(Arc::new(value), Utc::now());
    }

    /// Status of a key, if cached.
    pub fn query_status(&self, key: &QueryKey) -> Option<QueryStatus> {
        self.entries().get(key).map(|e| e.state.borrow().status)
    }

    /// Number of matching entries with a fetch in flight.
    pub fn is_fetching(&self, filter: &QueryFilter) -> usize {
        self.entries()
            .iter()
            .filter(|(key, entry)| filter.matches(key) && entry.in_flight.is_some())
            .count()
    }

    /// Removes matching entries. In-flight fetches still complete but their
    /// results are dropped.
    pub fn remove_queries(&self, filter: &QueryFilter) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|key, _| !filter.matches(key));
        before - entries.len()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries().clear();
    }

    // ------------------------------------------------------------------------
    // Garbage collection
    // ------------------------------------------------------------------------

    /// Removes entries that have gone `gc_time` without observers or
    /// in-flight fetches. Returns the number removed.
    pub fn gc(&self) -> usize {
        let gc_time = self.inner.config.gc_time;
        let mut entries = self.entries();
        let before = entries.len();

        entries.retain(|key, entry| {
            let keep = entry.observers > 0
                || entry.in_flight.is_some()
                || entry.last_used.elapsed() < gc_time;
            if !keep {
                debug!(key = %key, "collecting unused entry");
            }
            keep
        });

        let collected = before - entries.len();
        Counters::bump(&self.inner.counters.entries_collected, collected as u64);
        collected
    }

    // ------------------------------------------------------------------------
    // Dehydration
    // ------------------------------------------------------------------------

    /// Serializes every successful entry.
    pub fn dehydrate(&self) -> DehydratedState {
        let entries = self.entries();
        let mut queries: Vec<DehydratedQuery> = entries
            .iter()
            .filter_map(|(key, entry)| {
                let state = entry.state.borrow();
                if state.status != QueryStatus::Success {
                    return None;
                }
                let data = state.data.as_ref()?;
                let json = match entry.encode {
                    Some(encode) => encode(data),
                    None => data
                        .downcast_ref::<Hydrated>()
                        .map(|hydrated| hydrated.0.clone()),
                }?;
                Some(DehydratedQuery {
                    query_key: key.clone(),
                    data: json,
                    data_updated_at: state.data_updated_at.unwrap_or_else(Utc::now),
                })
            })
            .collect();
        queries.sort_by(|a, b| a.query_key.cmp(&b.query_key));

        DehydratedState { queries }
    }

    /// Loads dehydrated entries. Entries holding newer data are kept.
    ///
    /// Hydrated data counts as freshly fetched.
    pub fn hydrate(&self, state: DehydratedState) -> usize {
        let mut entries = self.entries();
        let mut loaded = 0;

        for query in state.queries {
            let entry = entries
                .entry(query.query_key.clone())
                .or_insert_with(|| CacheEntry::new(self.next_generation()));

            let newer_cached = {
                let current = entry.state.borrow();
                current.data.is_some()
                    && current
                        .data_updated_at
                        .is_some_and(|at| at >= query.data_updated_at)
            };
            if newer_cached {
                continue;
            }

            entry.last_used = Instant::now();
            entry.store_data(Arc::new(Hydrated(query.data)), query.data_updated_at);
            loaded += 1;
        }

        debug!(loaded, "hydrated queries");
        loaded
    }
}

fn type_error(key: &QueryKey) -> ClientError {
    ClientError::CacheType {
        key: key.to_string(),
    }
}

/// Serializable cache contents, produced on the prefetching side and
/// loaded on the rendering side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DehydratedState {
    pub queries: Vec<DehydratedQuery>,
}

/// One dehydrated entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DehydratedQuery {
    pub query_key: QueryKey,
    pub data: serde_json::Value,
    pub data_updated_at: DateTime<Utc>,
}
