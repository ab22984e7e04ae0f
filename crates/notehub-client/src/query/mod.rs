//! Client-side query cache.
//!
//! - `key`: query keys and filters
//! - `cache`: the `QueryClient` and its fetch lifecycle
//! - `observer`: typed subscriptions for views
//! - `mutation`: write tracking
//! - `gc`: background collection of unused entries

pub mod cache;
pub mod gc;
pub mod key;
pub mod mutation;
pub mod observer;

pub use cache::{
    DehydratedQuery, DehydratedState, QueryClient, QueryConfig, QueryData, QueryFn, QueryStats,
    QueryStatus,
};
pub use gc::CacheJanitor;
pub use key::{KeyPart, QueryFilter, QueryKey};
pub use mutation::{Mutation, MutationStatus};
pub use observer::{QueryObserver, QueryResult};
