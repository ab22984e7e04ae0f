//! Note queries on top of the cache.
//!
//! List results live under `["notes", search, page, tag]` and single notes
//! under `["note", id]`. Creating a note invalidates the `"notes"` namespace
//! only.

use std::sync::Arc;

use notehub_core::{CreateNotePayload, DEFAULT_PER_PAGE, ListNotesParams, Note, NoteId, NoteTag, NotesPage};
use tracing::info;

use crate::api::NotesApi;
use crate::error::{ClientError, ClientResult};
use crate::query::{QueryClient, QueryFilter, QueryFn, QueryKey, QueryObserver};

/// Namespace of list results.
pub const LIST_NAMESPACE: &str = "notes";

/// Namespace of single-note results.
pub const NOTE_NAMESPACE: &str = "note";

/// Cache key of a listing. The page size is not part of the key.
pub fn list_key(params: &ListNotesParams) -> QueryKey {
    QueryKey::new(LIST_NAMESPACE)
        .with(params.search_text())
        .with(params.page)
        .with(params.tag.map(|tag| tag.as_str()))
}

/// Cache key of a single note.
pub fn note_key(id: &NoteId) -> QueryKey {
    QueryKey::new(NOTE_NAMESPACE).with(id.as_str())
}

/// Every cached listing.
pub fn lists_filter() -> QueryFilter {
    QueryFilter::namespace(LIST_NAMESPACE)
}

/// Binds a `NotesApi` to a `QueryClient`.
pub struct NotesQueries<A: NotesApi> {
    api: Arc<A>,
    client: QueryClient,
    per_page: u32,
}

impl<A: NotesApi> Clone for NotesQueries<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            client: self.client.clone(),
            per_page: self.per_page,
        }
    }
}

impl<A: NotesApi> NotesQueries<A> {
    pub fn new(api: Arc<A>, client: QueryClient) -> Self {
        Self {
            api,
            client,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Listing parameters at the configured page size.
    pub fn list_params(&self, search: &str, page: u32, tag: Option<NoteTag>) -> ListNotesParams {
        ListNotesParams::first_page()
            .per_page(self.per_page)
            .search(search)
            .page(page)
            .tag(tag)
    }

    pub fn list_query_fn(&self, params: ListNotesParams) -> QueryFn {
        let api = Arc::clone(&self.api);
        QueryFn::new(move || {
            let api = Arc::clone(&api);
            let params = params.clone();
            async move { api.list_notes(&params).await }
        })
    }

    pub fn note_query_fn(&self, id: NoteId) -> QueryFn {
        let api = Arc::clone(&self.api);
        QueryFn::new(move || {
            let api = Arc::clone(&api);
            let id = id.clone();
            async move { api.get_note(&id).await }
        })
    }

    /// Subscribes to a listing, keeping the previous page visible while a
    /// new key loads.
    pub fn observe_list(&self, params: &ListNotesParams) -> QueryObserver<NotesPage> {
        self.client
            .observe(list_key(params), self.list_query_fn(params.clone()))
            .keep_previous_data(true)
    }

    pub fn observe_note(&self, id: &NoteId) -> QueryObserver<Note> {
        self.client
            .observe(note_key(id), self.note_query_fn(id.clone()))
    }

    pub async fn fetch_list(&self, params: &ListNotesParams) -> Result<Arc<NotesPage>, Arc<ClientError>> {
        self.client
            .fetch_query(&list_key(params), self.list_query_fn(params.clone()))
            .await
    }

    pub async fn fetch_note(&self, id: &NoteId) -> Result<Arc<Note>, Arc<ClientError>> {
        self.client
            .fetch_query(&note_key(id), self.note_query_fn(id.clone()))
            .await
    }

    pub async fn prefetch_list(&self, params: &ListNotesParams) {
        self.client
            .prefetch_query::<NotesPage>(&list_key(params), self.list_query_fn(params.clone()))
            .await;
    }

    pub async fn prefetch_note(&self, id: &NoteId) {
        self.client
            .prefetch_query::<Note>(&note_key(id), self.note_query_fn(id.clone()))
            .await;
    }

    /// Creates a note, then marks every cached listing stale.
    ///
    /// The created note is also cached under its own key.
    pub async fn create_note(&self, payload: &CreateNotePayload) -> ClientResult<Note> {
        let note = self.api.create_note(payload).await?;

        self.client.set_query_data(&note_key(&note.id), note.clone());
        let invalidated = self.client.invalidate_queries(&lists_filter());
        info!(id = %note.id, invalidated, "note created");

        Ok(note)
    }
}
