//! Typed subscriptions to cache entries.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::cache::{QueryClient, QueryData, QueryFn, QueryStatus, Snapshot, decode};
use super::key::QueryKey;
use crate::error::ClientError;

/// What a view renders for one query.
#[derive(Debug)]
pub struct QueryResult<T> {
    pub data: Option<Arc<T>>,
    pub error: Option<Arc<ClientError>>,
    pub status: QueryStatus,
    /// A fetch for the current key is in flight.
    pub is_fetching: bool,
    /// The entry was invalidated and has not been fetched since.
    pub is_stale: bool,
    /// `data` belongs to the previous key while the current one loads.
    pub is_placeholder_data: bool,
    pub data_updated_at: Option<DateTime<Utc>>,
}

impl<T> Clone for QueryResult<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            status: self.status,
            is_fetching: self.is_fetching,
            is_stale: self.is_stale,
            is_placeholder_data: self.is_placeholder_data,
            data_updated_at: self.data_updated_at,
        }
    }
}

impl<T> QueryResult<T> {
    pub fn is_pending(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// First load: nothing to show yet and a fetch is running.
    pub fn is_loading(&self) -> bool {
        self.is_pending() && self.is_fetching
    }
}

/// A live subscription to one key.
///
/// The entry is kept alive while the observer exists. Changing the key with
/// `set_query` moves the subscription; with keep-previous-data enabled the
/// last successful value stays visible until the new key resolves.
pub struct QueryObserver<T: QueryData> {
    client: QueryClient,
    key: QueryKey,
    receiver: watch::Receiver<Snapshot>,
    keep_previous_data: bool,
    previous: Option<Arc<T>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: QueryData> std::fmt::Debug for QueryObserver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryObserver")
            .field("key", &self.key)
            .field("keep_previous_data", &self.keep_previous_data)
            .finish_non_exhaustive()
    }
}

impl<T: QueryData> QueryObserver<T> {
    pub(crate) fn new(client: QueryClient, key: QueryKey, receiver: watch::Receiver<Snapshot>) -> Self {
        Self {
            client,
            key,
            receiver,
            keep_previous_data: false,
            previous: None,
            _marker: PhantomData,
        }
    }

    /// Keep showing the previous key's data while a new key loads.
    #[must_use]
    pub fn keep_previous_data(mut self, keep: bool) -> Self {
        self.keep_previous_data = keep;
        self
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Current state of the observed key.
    pub fn result(&self) -> QueryResult<T> {
        let snapshot = self.receiver.borrow();
        let data = snapshot.data.as_ref().and_then(decode::<T>);

        if snapshot.status == QueryStatus::Pending {
            if let Some(previous) = &self.previous {
                return QueryResult {
                    data: Some(Arc::clone(previous)),
                    error: None,
                    status: QueryStatus::Success,
                    is_fetching: snapshot.is_fetching,
                    is_stale: snapshot.is_invalidated,
                    is_placeholder_data: true,
                    data_updated_at: None,
                };
            }
        }

        QueryResult {
            data,
            error: snapshot.error.clone(),
            status: snapshot.status,
            is_fetching: snapshot.is_fetching,
            is_stale: snapshot.is_invalidated,
            is_placeholder_data: false,
            data_updated_at: snapshot.data_updated_at,
        }
    }

    /// Switches to another key. The old key loses this observer but any
    /// fetch for it keeps running.
    pub fn set_query(&mut self, key: QueryKey, query_fn: QueryFn) {
        if key == self.key {
            return;
        }

        if self.keep_previous_data {
            let current = self.result().data;
            if current.is_some() {
                self.previous = current;
            }
        } else {
            self.previous = None;
        }

        self.receiver = self.client.subscribe::<T>(&key, query_fn);
        let old = std::mem::replace(&mut self.key, key);
        self.client.unsubscribe(&old);
    }

    /// Waits for the next state change. Returns false once the entry has
    /// been removed from the cache.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Waits until the current key has a result and nothing is in flight.
    pub async fn settled(&mut self) -> QueryResult<T> {
        let _ = self
            .receiver
            .wait_for(|s| !s.is_fetching && s.status != QueryStatus::Pending)
            .await;
        self.result()
    }

    /// Fetches the current key again.
    pub fn refetch(&self) -> bool {
        self.client.refetch(&self.key)
    }
}

impl<T: QueryData> Drop for QueryObserver<T> {
    fn drop(&mut self) {
        self.client.unsubscribe(&self.key);
    }
}
