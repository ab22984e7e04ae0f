//! HTTP bindings for the NoteHub API.
//!
//! `NotesApi` is the seam between the query layer and the network: the
//! query cache, the views, and the form only ever see the trait, so tests
//! can substitute an in-memory implementation.

use std::future::Future;

use notehub_core::{CreateNotePayload, ListNotesParams, Note, NoteId, NotesPage};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Operations of the NoteHub REST API.
///
/// Each call performs exactly one round trip. There is no retry.
pub trait NotesApi: Send + Sync + 'static {
    /// `GET /notes?page&perPage&search&tag`
    fn list_notes(
        &self,
        params: &ListNotesParams,
    ) -> impl Future<Output = ClientResult<NotesPage>> + Send;

    /// `GET /notes/{id}`
    fn get_note(&self, id: &NoteId) -> impl Future<Output = ClientResult<Note>> + Send;

    /// `POST /notes`
    fn create_note(
        &self,
        payload: &CreateNotePayload,
    ) -> impl Future<Output = ClientResult<Note>> + Send;
}

/// `NotesApi` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpNotesApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNotesApi {
    /// Build an API client, optionally configured with a Bearer token.
    pub fn new(base_url: impl Into<String>, token: Option<&str>) -> ClientResult<Self> {
        Ok(Self {
            client: build_client(token)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build an API client from configuration.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(config.base_url.clone(), config.token.as_deref())
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of one note, with the id percent-encoded as a single segment.
    fn note_url(&self, id: &NoteId) -> String {
        let Ok(mut url) = reqwest::Url::parse(&self.url("/notes")) else {
            return self.url(&format!("/notes/{}", id));
        };
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id.as_str());
        }
        url.to_string()
    }
}

impl NotesApi for HttpNotesApi {
    async fn list_notes(&self, params: &ListNotesParams) -> ClientResult<NotesPage> {
        let mut query: Vec<(&str, String)> = vec![
            ("page", params.page.to_string()),
            ("perPage", params.per_page.to_string()),
        ];
        if let Some(search) = &params.search {
            query.push(("search", search.clone()));
        }
        if let Some(tag) = params.tag {
            query.push(("tag", tag.as_str().to_string()));
        }

        tracing::debug!(page = params.page, search = params.search_text(), tag = ?params.tag, "GET /notes");
        make_request(self.client.get(self.url("/notes")).query(&query)).await
    }

    async fn get_note(&self, id: &NoteId) -> ClientResult<Note> {
        tracing::debug!(%id, "GET /notes/:id");
        let request = self.client.get(self.note_url(id));
        match make_request(request).await {
            Err(ClientError::Http { status: 404, .. }) => Err(ClientError::NotFound(id.clone())),
            other => other,
        }
    }

    async fn create_note(&self, payload: &CreateNotePayload) -> ClientResult<Note> {
        tracing::debug!(title = %payload.title, tag = %payload.tag, "POST /notes");
        let request = self.client.post(self.url("/notes")).json(payload);
        match make_request(request).await {
            Err(ClientError::Http { status: 400 | 422, message }) => {
                Err(ClientError::Validation(message))
            }
            other => other,
        }
    }
}

/// Build an HTTP client, optionally configured with a Bearer token.
pub fn build_client(token: Option<&str>) -> ClientResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();

    if let Some(token) = token {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ClientError::Validation(format!("Invalid token value: {}", e)))?;
        headers.insert(AUTHORIZATION, value);
        builder = builder.default_headers(headers);
    }

    builder.build().map_err(ClientError::Network)
}

/// Send a request and decode a JSON body, mapping non-2xx statuses to
/// `ClientError::Http`.
pub async fn make_request<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> ClientResult<T> {
    let response = request.send().await.map_err(ClientError::Network)?;
    let status = response.status();

    if status.is_success() {
        let body = response.bytes().await.map_err(ClientError::Network)?;
        Ok(serde_json::from_slice(&body)?)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Http {
            status: status.as_u16(),
            message: error_message(status, &body),
        })
    }
}

/// Extract a human-readable message from an error body.
///
/// Accepts `{"error":{"message":..}}`, `{"message":..}` and `{"error":".."}`;
/// falls back to the raw body, then to the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let message = json
            .pointer("/error/message")
            .or_else(|| json.get("message"))
            .or_else(|| json.get("error"))
            .and_then(|v| v.as_str());
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
