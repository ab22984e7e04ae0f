//! View models of the notes list page and the note details page.
//!
//! A view owns its observers and input state; `render` turns them into a
//! plain screen value that any front end can draw.

use std::time::Duration;

use notehub_core::{Note, NoteId, NoteTag, NotesPage};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::NotesApi;
use crate::debounce::{Debouncer, debounce};
use crate::form::{NoteForm, NoteFormScreen, SubmitOutcome};
use crate::notes::{NotesQueries, list_key};
use crate::notify::Toaster;
use crate::pagination::{PageControls, page_controls};
use crate::query::{QueryObserver, QueryResult};

/// Shown when a listing has no notes.
pub const EMPTY_LIST_MESSAGE: &str = "Notes not found";

/// What woke `NotesView::next_event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// The debounced search text was applied.
    SearchApplied(String),
    /// The observed listing changed state.
    ListChanged,
    /// Nothing more will arrive.
    Closed,
}

/// Rendered notes list page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesScreen {
    pub tag: Option<NoteTag>,
    /// Search box contents, applied or not.
    pub search_input: String,
    pub page: u32,
    /// Show the loader.
    pub is_loading: bool,
    pub error: Option<String>,
    pub empty_message: Option<&'static str>,
    pub notes: Vec<Note>,
    pub pagination: Option<PageControls>,
    /// The notes belong to the previous search or page.
    pub is_placeholder: bool,
    pub form: Option<NoteFormScreen>,
}

/// The notes list page: search, tag filter, paging, and the creation form.
pub struct NotesView<A: NotesApi> {
    queries: NotesQueries<A>,
    tag: Option<NoteTag>,
    search: String,
    search_input: String,
    page: u32,
    observer: QueryObserver<NotesPage>,
    debouncer: Debouncer<String>,
    search_rx: mpsc::UnboundedReceiver<String>,
    form: Option<NoteForm>,
    toaster: Toaster,
}

impl<A: NotesApi> NotesView<A> {
    /// Mounts the page on page 1 with an empty search.
    pub fn new(queries: NotesQueries<A>, tag: Option<NoteTag>, toaster: Toaster, search_debounce: Duration) -> Self {
        let params = queries.list_params("", 1, tag);
        let observer = queries.observe_list(&params);
        let (debouncer, search_rx) = debounce(search_debounce);

        Self {
            queries,
            tag,
            search: String::new(),
            search_input: String::new(),
            page: 1,
            observer,
            debouncer,
            search_rx,
            form: None,
            toaster,
        }
    }

    pub fn tag(&self) -> Option<NoteTag> {
        self.tag
    }

    /// The applied search text.
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn toaster(&self) -> &Toaster {
        &self.toaster
    }

    /// Updates the search box. The search applies once typing pauses.
    pub fn type_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.search_input = text.clone();
        self.debouncer.call(text);
    }

    /// Applies any pending search text now.
    pub fn flush_search(&self) {
        self.debouncer.flush();
    }

    /// Applies a search text and returns to page 1.
    pub fn apply_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
        self.page = 1;
        self.refresh();
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
        self.refresh();
    }

    fn refresh(&mut self) {
        let params = self.queries.list_params(&self.search, self.page, self.tag);
        debug!(key = %list_key(&params), "notes view key changed");
        self.observer
            .set_query(list_key(&params), self.queries.list_query_fn(params));
    }

    pub fn open_form(&mut self) {
        if self.form.is_none() {
            self.form = Some(NoteForm::new(self.tag.unwrap_or_default()));
        }
    }

    pub fn close_form(&mut self) {
        if let Some(form) = self.form.as_mut() {
            form.cancel();
        }
        self.form = None;
    }

    pub fn form_mut(&mut self) -> Option<&mut NoteForm> {
        self.form.as_mut()
    }

    /// Submits the open form. The form is removed once it closes.
    pub async fn submit_form(&mut self) -> Option<SubmitOutcome> {
        let form = self.form.as_mut()?;
        let outcome = form.submit(&self.queries, &self.toaster).await;
        if matches!(outcome, SubmitOutcome::Created(_)) {
            self.form = None;
        }
        Some(outcome)
    }

    /// Waits for a debounced search or a listing change and applies it.
    pub async fn next_event(&mut self) -> ViewEvent {
        enum Wake {
            Search(Option<String>),
            List(bool),
        }

        let wake = tokio::select! {
            text = self.search_rx.recv() => Wake::Search(text),
            alive = self.observer.changed() => Wake::List(alive),
        };

        match wake {
            Wake::Search(Some(text)) => {
                self.apply_search(text.clone());
                ViewEvent::SearchApplied(text)
            }
            Wake::List(true) => ViewEvent::ListChanged,
            Wake::Search(None) | Wake::List(false) => ViewEvent::Closed,
        }
    }

    /// Waits until the current listing has loaded.
    pub async fn settle(&mut self) -> NotesScreen {
        self.observer.settled().await;
        self.render()
    }

    pub fn render(&self) -> NotesScreen {
        let result = self.observer.result();
        render_list(&result, self.page, self.tag, &self.search_input, self.form.as_ref())
    }
}

fn render_list(
    result: &QueryResult<NotesPage>,
    page: u32,
    tag: Option<NoteTag>,
    search_input: &str,
    form: Option<&NoteForm>,
) -> NotesScreen {
    let error = result
        .error
        .as_ref()
        .filter(|_| result.is_error())
        .map(|e| format!("Could not fetch the list of notes. {}", e.user_message()));

    let (notes, empty_message, pagination) = match &result.data {
        Some(data) if result.is_success() => (
            data.notes.clone(),
            data.is_empty().then_some(EMPTY_LIST_MESSAGE),
            page_controls(page, data.total_pages),
        ),
        _ => (Vec::new(), None, None),
    };

    NotesScreen {
        tag,
        search_input: search_input.to_string(),
        page,
        is_loading: result.is_fetching,
        error,
        empty_message,
        notes,
        pagination,
        is_placeholder: result.is_placeholder_data,
        form: form.map(NoteForm::screen),
    }
}

/// Rendered note details page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetailsScreen {
    pub is_loading: bool,
    pub error: Option<String>,
    pub note: Option<Note>,
}

/// The note details page.
pub struct NoteDetailsView {
    observer: QueryObserver<Note>,
}

impl NoteDetailsView {
    pub fn new<A: NotesApi>(queries: &NotesQueries<A>, id: &NoteId) -> Self {
        Self {
            observer: queries.observe_note(id),
        }
    }

    pub async fn settle(&mut self) -> NoteDetailsScreen {
        self.observer.settled().await;
        self.render()
    }

    pub fn render(&self) -> NoteDetailsScreen {
        let result = self.observer.result();
        NoteDetailsScreen {
            is_loading: result.is_loading(),
            error: result
                .error
                .as_ref()
                .filter(|_| result.is_error())
                .map(|e| format!("Could not fetch note details. {}", e.user_message())),
            note: result.data.as_deref().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryClient;
    use crate::testing::MockNotesApi;
    use std::sync::Arc;

    const DEBOUNCE: Duration = Duration::from_millis(1000);

    fn mount(api: MockNotesApi, tag: Option<NoteTag>) -> (Arc<MockNotesApi>, NotesView<MockNotesApi>) {
        let api = Arc::new(api);
        let queries = NotesQueries::new(Arc::clone(&api), QueryClient::new());
        let view = NotesView::new(queries, tag, Toaster::new(), DEBOUNCE);
        (api, view)
    }

    #[tokio::test(start_paused = true)]
    async fn renders_loader_then_notes() {
        let (_api, mut view) = mount(MockNotesApi::with_notes(3), None);
        assert!(view.render().is_loading);

        let screen = view.settle().await;
        assert!(!screen.is_loading);
        assert_eq!(screen.notes.len(), 3);
        assert!(screen.pagination.is_none());
        assert!(screen.empty_message.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn pagination_only_when_more_than_one_page() {
        let (_api, mut view) = mount(MockNotesApi::with_notes(30), None);
        let screen = view.settle().await;
        let controls = screen.pagination.unwrap();
        assert_eq!(controls.total, 3);

        view.set_page(3);
        let screen = view.settle().await;
        assert_eq!(screen.notes.len(), 6);
        assert_eq!(screen.pagination.unwrap().current, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_listing_says_not_found() {
        let (_api, mut view) = mount(MockNotesApi::new(), None);
        let screen = view.settle().await;
        assert_eq!(screen.empty_message, Some("Notes not found"));
        assert!(screen.pagination.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn list_error_is_rendered() {
        let api = MockNotesApi::new();
        api.fail_lists(true);
        let (_api, mut view) = mount(api, None);

        let screen = view.settle().await;
        assert_eq!(
            screen.error.as_deref(),
            Some("Could not fetch the list of notes. Internal Server Error")
        );
        assert!(screen.notes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn search_waits_for_quiet_and_resets_page() {
        let (api, mut view) = mount(MockNotesApi::with_notes(30), None);
        view.settle().await;
        view.set_page(2);
        view.settle().await;
        assert_eq!(api.lists(), 2);

        let start = tokio::time::Instant::now();
        view.type_search("Note 1");
        tokio::time::sleep(Duration::from_millis(400)).await;
        view.type_search("Note 2");
        assert_eq!(api.lists(), 2);

        let event = loop {
            match view.next_event().await {
                ViewEvent::ListChanged => continue,
                other => break other,
            }
        };
        assert_eq!(event, ViewEvent::SearchApplied("Note 2".to_string()));
        assert!(start.elapsed() >= Duration::from_millis(1400));
        assert_eq!(view.page(), 1);

        let screen = view.settle().await;
        assert_eq!(api.lists(), 3);
        assert!(screen.notes.iter().all(|n| n.title.contains("Note 2")));
    }

    #[tokio::test(start_paused = true)]
    async fn previous_page_stays_visible_while_loading() {
        let (_api, mut view) = mount(
            MockNotesApi::with_notes(30).with_delay(Duration::from_millis(100)),
            None,
        );
        let first = view.settle().await;

        view.set_page(2);
        let during = view.render();
        assert!(during.is_placeholder);
        assert!(during.is_loading);
        assert_eq!(during.notes, first.notes);

        let after = view.settle().await;
        assert!(!after.is_placeholder);
        assert_ne!(after.notes, first.notes);
    }

    #[tokio::test(start_paused = true)]
    async fn creating_a_note_refreshes_every_mounted_list() {
        let api = Arc::new(MockNotesApi::with_notes(10));
        let client = QueryClient::new();
        let queries = NotesQueries::new(Arc::clone(&api), client);
        let mut all = NotesView::new(queries.clone(), None, Toaster::new(), DEBOUNCE);
        let mut work = NotesView::new(queries.clone(), Some(NoteTag::Work), Toaster::new(), DEBOUNCE);
        let mut todo = NotesView::new(queries, Some(NoteTag::Todo), Toaster::new(), DEBOUNCE);
        all.settle().await;
        work.settle().await;
        todo.settle().await;
        assert_eq!(api.lists(), 3);

        all.open_form();
        {
            let form = all.form_mut().unwrap();
            form.set_title("Buy milk");
            form.set_tag("Todo");
        }
        let outcome = all.submit_form().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Created(_)));

        let all_screen = all.settle().await;
        let work_screen = work.settle().await;
        let todo_screen = todo.settle().await;
        assert_eq!(api.lists(), 6);
        assert!(all_screen.notes.iter().any(|n| n.title == "Buy milk"));
        assert!(todo_screen.notes.iter().any(|n| n.title == "Buy milk"));
        assert!(work_screen.notes.iter().all(|n| n.tag == NoteTag::Work));
    }

    #[tokio::test(start_paused = true)]
    async fn creating_a_note_refreshes_the_list() {
        let (api, mut view) = mount(MockNotesApi::with_notes(2), Some(NoteTag::Shopping));
        view.settle().await;

        view.open_form();
        {
            let form = view.form_mut().unwrap();
            assert_eq!(form.values().tag, "Shopping");
            form.set_title("Buy milk");
        }
        let outcome = view.submit_form().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Created(_)));
        assert!(view.render().form.is_none());

        let screen = view.settle().await;
        assert_eq!(api.lists(), 2);
        assert!(screen.notes.iter().any(|n| n.title == "Buy milk"));
        assert_eq!(
            view.toaster().recent()[0].message,
            "The note Buy milk has been created."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn details_view_renders_note_or_error() {
        let api = Arc::new(MockNotesApi::with_notes(1));
        let queries = NotesQueries::new(Arc::clone(&api), QueryClient::new());

        let mut found = NoteDetailsView::new(&queries, &NoteId::new("seed-000"));
        let screen = found.settle().await;
        assert_eq!(screen.note.unwrap().title, "Note 0");

        let mut missing = NoteDetailsView::new(&queries, &NoteId::new("nope"));
        let screen = missing.settle().await;
        assert!(screen.note.is_none());
        assert_eq!(
            screen.error.as_deref(),
            Some("Could not fetch note details. note not found: nope")
        );
    }
}
