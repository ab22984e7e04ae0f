//! Application routes and their prefetching.
//!
//! | Path | Route | Prefetched key |
//! |---|---|---|
//! | `/notes/{id}` | `NoteDetails` | `["note", id]` |
//! | `/notes/filter/{tag}/...` | `FilteredNotes` | `["notes", "", 1, tag]` |
//!
//! The tag segment `All` means no filter. Segments after the tag are
//! ignored.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use notehub_core::{NoteId, NoteIdParseError, NoteTag};
use thiserror::Error;
use tracing::debug;

use crate::api::NotesApi;
use crate::notes::{NotesQueries, list_key, note_key};
use crate::query::{DehydratedState, QueryClient, QueryKey};

/// Tag segment meaning "every tag".
pub const ALL_TAGS_SEGMENT: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    NoteDetails(NoteId),
    FilteredNotes { tag: Option<NoteTag> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("page not found: {0}")]
    NotFound(String),

    #[error("unknown tag: {0}")]
    UnknownTag(String),

    #[error("invalid note id: {0}")]
    InvalidId(#[from] NoteIdParseError),
}

impl Route {
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["notes", "filter", tag, ..] => {
                let tag = if *tag == ALL_TAGS_SEGMENT {
                    None
                } else {
                    Some(
                        tag.parse::<NoteTag>()
                            .map_err(|_| RouteError::UnknownTag(tag.to_string()))?,
                    )
                };
                Ok(Self::FilteredNotes { tag })
            }
            ["notes", "filter"] => Err(RouteError::NotFound(path.to_string())),
            ["notes", id] => Ok(Self::NoteDetails(id.parse()?)),
            _ => Err(RouteError::NotFound(path.to_string())),
        }
    }

    /// Canonical path of the route.
    pub fn path(&self) -> String {
        match self {
            Self::NoteDetails(id) => format!("/notes/{}", id),
            Self::FilteredNotes { tag } => format!(
                "/notes/filter/{}",
                tag.map_or(ALL_TAGS_SEGMENT, |tag| tag.as_str())
            ),
        }
    }

    /// The key the route's page reads first.
    pub fn prefetch_key<A: NotesApi>(&self, queries: &NotesQueries<A>) -> QueryKey {
        match self {
            Self::NoteDetails(id) => note_key(id),
            Self::FilteredNotes { tag } => list_key(&queries.list_params("", 1, *tag)),
        }
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Prefetches what a route renders first into a fresh cache and returns
/// that cache dehydrated.
///
/// Fetch errors are not returned: the state then lacks the key and the
/// page fetches it itself.
pub async fn prefetch_route<A: NotesApi>(route: &Route, api: Arc<A>, per_page: u32) -> DehydratedState {
    let queries = NotesQueries::new(api, QueryClient::new()).with_per_page(per_page);

    match route {
        Route::NoteDetails(id) => queries.prefetch_note(id).await,
        Route::FilteredNotes { tag } => {
            queries.prefetch_list(&queries.list_params("", 1, *tag)).await;
        }
    }

    let state = queries.client().dehydrate();
    debug!(route = %route, queries = state.queries.len(), "prefetched route");
    state
}
