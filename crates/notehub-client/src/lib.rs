//! notehub-client: headless NoteHub front end
//!
//! This crate provides:
//! - An HTTP binding of the NoteHub API behind the `NotesApi` trait
//! - A key-addressed query cache with request deduplication, invalidation,
//!   keep-previous-data observers, and hydration
//! - A trailing-edge debouncer for the search box
//! - The note creation form and its submission state machine
//! - Pagination controls, routes with prefetching, and toasts
//! - View models of the notes list and note details pages

pub mod api;
pub mod config;
pub mod debounce;
pub mod error;
pub mod form;
pub mod notes;
pub mod notify;
pub mod pagination;
pub mod query;
pub mod route;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{HttpNotesApi, NotesApi};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ClientResult};
pub use form::{FormPhase, NoteForm, SubmitOutcome};
pub use notes::NotesQueries;
pub use notify::{Toast, ToastKind, Toaster};
pub use query::{QueryClient, QueryConfig};
pub use route::{Route, RouteError, prefetch_route};
pub use view::{NoteDetailsView, NotesView};
