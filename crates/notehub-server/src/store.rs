//! In-memory note storage.

use std::sync::Arc;

use chrono::{Duration, Utc};
use notehub_core::{CreateNotePayload, ListNotesParams, Note, NoteId, NoteTag, NotesPage};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Notes held in memory for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    notes: Arc<RwLock<Vec<Note>>>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// One page of notes matching the listing parameters, newest first.
    pub async fn list(&self, params: &ListNotesParams) -> NotesPage {
        let notes = self.notes.read().await;
        NotesPage::select(&notes, params)
    }

    pub async fn get(&self, id: &NoteId) -> Option<Note> {
        let notes = self.notes.read().await;
        notes.iter().find(|note| &note.id == id).cloned()
    }

    /// Stores a note under a fresh UUID. The payload must already be valid.
    pub async fn create(&self, payload: CreateNotePayload) -> Note {
        let id = NoteId::new(Uuid::new_v4().to_string());
        let note = Note::from_payload(id, payload, Utc::now());
        self.notes.write().await.push(note.clone());
        note
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Loads a handful of sample notes, spaced a minute apart.
    pub async fn seed(&self) -> usize {
        const SAMPLES: &[(&str, &str, NoteTag)] = &[
            ("Quarterly report", "Collect numbers from every team lead.", NoteTag::Work),
            ("Dentist", "Tuesday at 9:30, bring the insurance card.", NoteTag::Personal),
            ("Sprint planning", "Review the backlog and estimate new stories.", NoteTag::Meeting),
            ("Groceries", "Eggs, bread, coffee, apples.", NoteTag::Shopping),
            ("Renew passport", "", NoteTag::Todo),
            ("Code review", "Look at the pagination changes.", NoteTag::Work),
            ("Call mom", "Sunday evening.", NoteTag::Personal),
            ("Retro", "What went well, what to change.", NoteTag::Meeting),
            ("Hardware store", "Light bulbs and wood glue.", NoteTag::Shopping),
            ("Book flights", "Compare prices for the June trip.", NoteTag::Todo),
            ("Onboarding docs", "Update the setup guide.", NoteTag::Work),
            ("Gym plan", "Three sessions a week.", NoteTag::Personal),
            ("One-on-one", "Career goals for next year.", NoteTag::Meeting),
            ("Birthday gift", "Something for the garden.", NoteTag::Shopping),
            ("Tax return", "Deadline at the end of the month.", NoteTag::Todo),
        ];

        let start = Utc::now() - Duration::minutes(SAMPLES.len() as i64);
        let mut notes = self.notes.write().await;
        for (i, (title, content, tag)) in SAMPLES.iter().enumerate() {
            let payload = CreateNotePayload {
                title: (*title).to_string(),
                content: (*content).to_string(),
                tag: *tag,
            };
            let id = NoteId::new(Uuid::new_v4().to_string());
            notes.push(Note::from_payload(id, payload, start + Duration::minutes(i as i64)));
        }
        SAMPLES.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(title: &str, tag: NoteTag) -> CreateNotePayload {
        CreateNotePayload {
            title: title.to_string(),
            content: String::new(),
            tag,
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = NoteStore::new();
        let note = store.create(payload("Buy milk", NoteTag::Shopping)).await;

        assert_eq!(store.get(&note.id).await, Some(note.clone()));
        assert_eq!(note.created_at, note.updated_at);
        assert!(store.get(&NoteId::new("missing")).await.is_none());
    }

    #[tokio::test]
    async fn list_filters_by_tag() {
        let store = NoteStore::new();
        assert_eq!(store.seed().await, 15);

        let work = store
            .list(&ListNotesParams::first_page().tag(Some(NoteTag::Work)))
            .await;
        assert_eq!(work.notes.len(), 3);
        assert!(work.notes.iter().all(|n| n.tag == NoteTag::Work));

        let all = store.list(&ListNotesParams::first_page()).await;
        assert_eq!(all.notes.len(), 12);
        assert_eq!(all.total_pages, 2);
        // newest first
        assert_eq!(all.notes[0].title, "Tax return");
    }
}
