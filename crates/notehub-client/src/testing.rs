//! In-memory `NotesApi` for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use notehub_core::{CreateNotePayload, ListNotesParams, Note, NoteId, NoteTag, NotesPage};

use crate::api::NotesApi;
use crate::error::{ClientError, ClientResult};

#[derive(Default)]
pub(crate) struct MockNotesApi {
    notes: Mutex<Vec<Note>>,
    delay: Duration,
    fail_lists: AtomicBool,
    reject_create: Mutex<Option<String>>,
    next_id: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
}

impl MockNotesApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `count` notes, cycling through the tags, newest first by index.
    pub fn with_notes(count: usize) -> Self {
        let api = Self::new();
        {
            let mut notes = api.notes.lock().unwrap();
            for i in 0..count {
                let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::minutes(i as i64);
                notes.push(Note {
                    id: NoteId::new(format!("seed-{:03}", i)),
                    title: format!("Note {}", i),
                    content: format!("Body of note {}", i),
                    tag: NoteTag::ALL[i % NoteTag::ALL.len()],
                    created_at: created,
                    updated_at: created,
                });
            }
        }
        api
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn reject_create(&self, message: Option<&str>) {
        *self.reject_create.lock().unwrap() = message.map(str::to_string);
    }

    pub fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl NotesApi for MockNotesApi {
    async fn list_notes(&self, params: &ListNotesParams) -> ClientResult<NotesPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(ClientError::Http {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        let notes = self.notes.lock().unwrap();
        Ok(NotesPage::select(&notes, params))
    }

    async fn get_note(&self, id: &NoteId) -> ClientResult<Note> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let notes = self.notes.lock().unwrap();
        notes
            .iter()
            .find(|note| &note.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(id.clone()))
    }

    async fn create_note(&self, payload: &CreateNotePayload) -> ClientResult<Note> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(message) = self.reject_create.lock().unwrap().clone() {
            return Err(ClientError::Validation(message));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let note = Note::from_payload(NoteId::new(format!("new-{}", n)), payload.clone(), Utc::now());
        self.notes.lock().unwrap().push(note.clone());
        Ok(note)
    }
}
