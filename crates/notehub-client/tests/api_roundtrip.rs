//! Drives the development server with the HTTP client.

use std::sync::Arc;
use std::time::Duration;

use notehub_client::query::QueryClient;
use notehub_client::view::ViewEvent;
use notehub_client::{
    ClientError, HttpNotesApi, NotesApi, NotesQueries, NotesView, Route, SubmitOutcome, Toaster,
    prefetch_route,
};
use notehub_core::{CreateNotePayload, ListNotesParams, NoteId, NoteTag};
use notehub_server::{AppState, NoteStore, ServerConfig, app};
use tokio::net::TcpListener;

async fn spawn_server(config: ServerConfig) -> String {
    let store = NoteStore::new();
    if config.seed {
        store.seed().await;
    }
    let router = app(AppState::new(store, config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

fn empty_server() -> ServerConfig {
    ServerConfig {
        seed: false,
        ..ServerConfig::default()
    }
}

fn buy_milk() -> CreateNotePayload {
    CreateNotePayload {
        title: "Buy milk".to_string(),
        content: String::new(),
        tag: NoteTag::Shopping,
    }
}

#[tokio::test]
async fn create_then_list_and_get() {
    let base_url = spawn_server(empty_server()).await;
    let api = HttpNotesApi::new(base_url, None).unwrap();

    let created = api.create_note(&buy_milk()).await.unwrap();
    assert_eq!(created.title, "Buy milk");
    assert_eq!(created.tag, NoteTag::Shopping);

    let page = api.list_notes(&ListNotesParams::first_page()).await.unwrap();
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.notes, vec![created.clone()]);

    let fetched = api.get_note(&created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn missing_note_is_not_found() {
    let base_url = spawn_server(empty_server()).await;
    let api = HttpNotesApi::new(base_url, None).unwrap();

    let err = api.get_note(&NoteId::new("does-not-exist")).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn server_validation_message_is_surfaced() {
    let base_url = spawn_server(empty_server()).await;
    let api = HttpNotesApi::new(base_url, None).unwrap();

    let payload = CreateNotePayload {
        title: "x".repeat(51),
        content: String::new(),
        tag: NoteTag::Todo,
    };
    let err = api.create_note(&payload).await.unwrap_err();
    match err {
        ClientError::Validation(message) => assert_eq!(message, "title: Name is too long"),
        other => panic!("expected Validation, got {:?}", other),
    }
}

#[tokio::test]
async fn token_is_sent_when_configured() {
    let base_url = spawn_server(ServerConfig {
        token: Some("secret".to_string()),
        ..empty_server()
    })
    .await;

    let anonymous = HttpNotesApi::new(base_url.clone(), None).unwrap();
    let err = anonymous
        .list_notes(&ListNotesParams::first_page())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));

    let authorized = HttpNotesApi::new(base_url, Some("secret")).unwrap();
    authorized
        .list_notes(&ListNotesParams::first_page())
        .await
        .unwrap();
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpNotesApi::new(format!("http://{}", addr), None).unwrap();
    let err = api.list_notes(&ListNotesParams::first_page()).await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
}

#[tokio::test]
async fn concurrent_fetches_hit_the_server_once() {
    let base_url = spawn_server(ServerConfig::default()).await;
    let api = Arc::new(HttpNotesApi::new(base_url, None).unwrap());
    let client = QueryClient::new();
    let queries = NotesQueries::new(api, client.clone());

    let params = queries.list_params("", 1, None);
    let (a, b) = tokio::join!(queries.fetch_list(&params), queries.fetch_list(&params));

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(client.stats().fetches_started, 1);
    assert_eq!(client.stats().fetches_deduped, 1);
}

#[tokio::test]
async fn prefetched_route_renders_without_refetch() {
    let base_url = spawn_server(ServerConfig::default()).await;
    let api = Arc::new(HttpNotesApi::new(base_url, None).unwrap());

    let route: Route = "/notes/filter/Work".parse().unwrap();
    let state = prefetch_route(&route, Arc::clone(&api), 12).await;
    let state = serde_json::from_str(&serde_json::to_string(&state).unwrap()).unwrap();

    let client = QueryClient::new();
    assert_eq!(client.hydrate(state), 1);

    let queries = NotesQueries::new(api, client.clone());
    let view = NotesView::new(queries, Some(NoteTag::Work), Toaster::new(), Duration::from_millis(50));
    let screen = view.render();

    assert!(!screen.is_loading);
    assert_eq!(screen.notes.len(), 3);
    assert_eq!(client.stats().fetches_started, 0);
}

#[tokio::test]
async fn created_note_appears_in_mounted_list() {
    let base_url = spawn_server(empty_server()).await;
    let api = Arc::new(HttpNotesApi::new(base_url, None).unwrap());
    let queries = NotesQueries::new(api, QueryClient::new());
    let mut view = NotesView::new(queries, None, Toaster::new(), Duration::from_millis(50));

    let screen = view.settle().await;
    assert_eq!(screen.empty_message, Some("Notes not found"));

    view.open_form();
    {
        let form = view.form_mut().unwrap();
        form.set_title("Buy milk");
        form.set_content("");
        form.set_tag("Shopping");
    }
    let outcome = view.submit_form().await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Created(_)));

    let screen = view.settle().await;
    assert!(screen.form.is_none());
    assert_eq!(screen.notes.len(), 1);
    assert_eq!(screen.notes[0].title, "Buy milk");
}

#[tokio::test]
async fn debounced_search_reaches_the_server() {
    let base_url = spawn_server(ServerConfig::default()).await;
    let api = Arc::new(HttpNotesApi::new(base_url, None).unwrap());
    let queries = NotesQueries::new(api, QueryClient::new());
    let mut view = NotesView::new(queries, None, Toaster::new(), Duration::from_millis(50));
    view.settle().await;

    view.type_search("passport");
    let event = loop {
        match view.next_event().await {
            ViewEvent::ListChanged => continue,
            other => break other,
        }
    };
    assert_eq!(event, ViewEvent::SearchApplied("passport".to_string()));

    let screen = view.settle().await;
    assert_eq!(screen.notes.len(), 1);
    assert_eq!(screen.notes[0].title, "Renew passport");
}
