//! Note routes.
//!
//! - GET /notes?page&perPage&search&tag - One page of notes
//! - GET /notes/{id} - A single note
//! - POST /notes - Create a note

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use notehub_core::{CreateNotePayload, ListNotesParams, Note, NoteId, NoteTag, NotesPage, validate_payload};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::extract::Authorized;
use crate::state::AppState;

/// Largest accepted page size.
const MAX_PER_PAGE: u32 = 100;

/// Query string of GET /notes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub tag: Option<String>,
}

impl ListNotesQuery {
    fn into_params(self) -> ApiResult<ListNotesParams> {
        let tag = match self.tag.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<NoteTag>()
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            ),
        };

        let mut params = ListNotesParams::first_page()
            .page(self.page.unwrap_or(1))
            .tag(tag)
            .search(self.search.unwrap_or_default());
        if let Some(per_page) = self.per_page {
            params = params.per_page(per_page.min(MAX_PER_PAGE));
        }
        Ok(params)
    }
}

/// GET /notes
async fn list_notes(
    _auth: Authorized,
    State(state): State<AppState>,
    Query(query): Query<ListNotesQuery>,
) -> ApiResult<Json<NotesPage>> {
    let params = query.into_params()?;
    let page = state.store().list(&params).await;

    tracing::debug!(
        page = params.page,
        search = params.search_text(),
        tag = ?params.tag,
        returned = page.notes.len(),
        total_pages = page.total_pages,
        "Listed notes"
    );
    Ok(Json(page))
}

/// GET /notes/{id}
async fn get_note(
    _auth: Authorized,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Note>> {
    let id = NoteId::new(id);
    state
        .store()
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Note {} not found", id)))
}

/// POST /notes
async fn create_note(
    _auth: Authorized,
    State(state): State<AppState>,
    payload: Result<Json<CreateNotePayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    validate_payload(&payload).map_err(ApiError::Validation)?;

    let note = state.store().create(payload).await;
    tracing::info!(id = %note.id, tag = %note.tag, "Created note");

    Ok((StatusCode::CREATED, Json(note)))
}

/// Build note routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/{id}", get(get_note))
}
