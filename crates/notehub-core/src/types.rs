//! Core data types for NoteHub.
//!
//! This module defines the types shared by the client and the server:
//!
//! - `Note`: a user-authored record with title, content, and tag
//! - `NoteTag`: the closed five-value classification of notes
//! - `NotesPage`: one page of a note listing plus the total page count
//! - `ListNotesParams`: paging, search, and tag filter for a listing
//! - `CreateNotePayload`: the body of a note creation request
//!
//! Wire names are camelCase to match the NoteHub HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default number of notes per page.
pub const DEFAULT_PER_PAGE: u32 = 12;

// ============================================================================
// ID Types
// ============================================================================

/// Identifier of a note.
///
/// The server assigns ids and the client treats them as opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Creates a NoteId from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NoteId {
    type Err = NoteIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NoteIdParseError::Empty);
        }
        if s.contains('/') {
            return Err(NoteIdParseError::InvalidCharacter('/'));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Error type for parsing a NoteId from a path segment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteIdParseError {
    /// The id was empty.
    #[error("note id is empty")]
    Empty,
    /// The id contained a character that cannot appear in a path segment.
    #[error("note id contains invalid character {0:?}")]
    InvalidCharacter(char),
}

// ============================================================================
// Tags
// ============================================================================

/// Classification of a note.
///
/// A closed set: used as a note field and as a listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoteTag {
    Work,
    Personal,
    Meeting,
    Shopping,
    Todo,
}

impl NoteTag {
    /// All tags, in the order the API documents them.
    pub const ALL: [NoteTag; 5] = [
        NoteTag::Work,
        NoteTag::Personal,
        NoteTag::Meeting,
        NoteTag::Shopping,
        NoteTag::Todo,
    ];

    /// Returns the wire name of the tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Meeting => "Meeting",
            Self::Shopping => "Shopping",
            Self::Todo => "Todo",
        }
    }
}

impl Default for NoteTag {
    /// Tag preselected by the creation form when no filter applies.
    fn default() -> Self {
        Self::Todo
    }
}

impl fmt::Display for NoteTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteTag {
    type Err = NoteTagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| NoteTagParseError(s.to_string()))
    }
}

/// Error returned when a string is not one of the five tags.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown note tag: {0:?}")]
pub struct NoteTagParseError(pub String);

// ============================================================================
// Notes
// ============================================================================

/// A note as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Server-assigned identifier.
    pub id: NoteId,

    /// Title, 3 to 50 characters.
    pub title: String,

    /// Body text, up to 500 characters, possibly empty.
    #[serde(default)]
    pub content: String,

    /// Classification tag.
    pub tag: NoteTag,

    /// When the note was created.
    pub created_at: DateTime<Utc>,

    /// When the note was last updated. Equal to `created_at` for new notes.
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Builds a note from a creation payload, as the server does on POST.
    #[must_use]
    pub fn from_payload(id: NoteId, payload: CreateNotePayload, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: payload.title,
            content: payload.content,
            tag: payload.tag,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the search text occurs in the title or content,
    /// ignoring case.
    #[must_use]
    pub fn matches_search(&self, search: &str) -> bool {
        let needle = search.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.content.to_lowercase().contains(&needle)
    }
}

/// Request body for creating a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNotePayload {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub tag: NoteTag,
}

/// One page of notes plus the total number of pages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesPage {
    pub notes: Vec<Note>,
    pub total_pages: u32,
}

impl NotesPage {
    /// Returns true if the page holds no notes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Returns true if the listing spans more than one page.
    #[must_use]
    pub fn is_paginated(&self) -> bool {
        self.total_pages > 1
    }

    /// Applies a listing request to an in-memory collection.
    ///
    /// Filters by tag and search text, orders newest first, then slices out
    /// the requested page. Pages past the end are empty.
    #[must_use]
    pub fn select(notes: &[Note], params: &ListNotesParams) -> Self {
        let mut matching: Vec<&Note> = notes
            .iter()
            .filter(|note| params.tag.is_none_or(|tag| note.tag == tag))
            .filter(|note| {
                params
                    .search
                    .as_deref()
                    .is_none_or(|search| note.matches_search(search))
            })
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let per_page = params.per_page.max(1) as usize;
        let total_pages = matching.len().div_ceil(per_page) as u32;
        let start = (params.page.max(1) as usize - 1) * per_page;

        Self {
            notes: matching
                .into_iter()
                .skip(start)
                .take(per_page)
                .cloned()
                .collect(),
            total_pages,
        }
    }
}

// ============================================================================
// Listing parameters
// ============================================================================

/// Parameters of a note listing request.
///
/// Pages are 1-based. An empty search is treated as no search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesParams {
    pub page: u32,
    pub per_page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<NoteTag>,
}

impl ListNotesParams {
    /// First page, default page size, no search, no tag.
    #[must_use]
    pub fn first_page() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            search: None,
            tag: None,
        }
    }

    /// Sets the page, clamping to 1.
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Sets the page size, clamping to 1.
    #[must_use]
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Sets the search text. Blank text clears the search.
    #[must_use]
    pub fn search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() {
            None
        } else {
            Some(search)
        };
        self
    }

    /// Sets or clears the tag filter.
    #[must_use]
    pub fn tag(mut self, tag: Option<NoteTag>) -> Self {
        self.tag = tag;
        self
    }

    /// Returns the search text, or "" when none is set.
    #[must_use]
    pub fn search_text(&self) -> &str {
        self.search.as_deref().unwrap_or("")
    }
}

impl Default for ListNotesParams {
    fn default() -> Self {
        Self::first_page()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note() -> Note {
        let now = Utc::now();
        Note::from_payload(
            NoteId::new("n-1"),
            CreateNotePayload {
                title: "Buy milk".to_string(),
                content: "Two litres, semi-skimmed".to_string(),
                tag: NoteTag::Shopping,
            },
            now,
        )
    }

    #[test]
    fn note_uses_camel_case_on_the_wire() {
        let json = serde_json::to_value(sample_note()).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["tag"], "Shopping");
        assert_eq!(json["id"], "n-1");
    }

    #[test]
    fn note_content_defaults_to_empty() {
        let json = r#"{
            "id": "abc",
            "title": "Standup",
            "tag": "Meeting",
            "createdAt": "2025-01-02T03:04:05Z",
            "updatedAt": "2025-01-02T03:04:05Z"
        }"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.content, "");
        assert_eq!(note.tag, NoteTag::Meeting);
    }

    #[test]
    fn notes_page_parses_total_pages() {
        let page: NotesPage = serde_json::from_str(r#"{"notes":[],"totalPages":3}"#).unwrap();
        assert_eq!(page.total_pages, 3);
        assert!(page.is_empty());
        assert!(page.is_paginated());
    }

    #[test]
    fn tag_parse_is_exact() {
        assert_eq!("Work".parse::<NoteTag>().unwrap(), NoteTag::Work);
        assert!("work".parse::<NoteTag>().is_err());
        assert!("All".parse::<NoteTag>().is_err());
    }

    #[test]
    fn tag_display_matches_wire_name() {
        for tag in NoteTag::ALL {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag));
        }
    }

    #[test]
    fn tag_default_is_todo() {
        assert_eq!(NoteTag::default(), NoteTag::Todo);
    }

    #[test]
    fn note_id_rejects_empty_and_slash() {
        assert_eq!("".parse::<NoteId>(), Err(NoteIdParseError::Empty));
        assert_eq!(
            "a/b".parse::<NoteId>(),
            Err(NoteIdParseError::InvalidCharacter('/'))
        );
        assert_eq!("  x1 ".parse::<NoteId>().unwrap().as_str(), "x1");
    }

    #[test]
    fn blank_search_is_no_search() {
        let params = ListNotesParams::first_page().search("   ");
        assert_eq!(params.search, None);
        assert_eq!(params.search_text(), "");

        let params = ListNotesParams::first_page().search("milk");
        assert_eq!(params.search_text(), "milk");
    }

    #[test]
    fn page_is_clamped_to_one() {
        let params = ListNotesParams::first_page().page(0).per_page(0);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 1);
    }

    #[test]
    fn select_filters_orders_and_pages() {
        let base = Utc::now();
        let notes: Vec<Note> = (0..5)
            .map(|i| {
                Note::from_payload(
                    NoteId::new(format!("n-{}", i)),
                    CreateNotePayload {
                        title: format!("Note {}", i),
                        content: String::new(),
                        tag: if i % 2 == 0 { NoteTag::Work } else { NoteTag::Todo },
                    },
                    base + chrono::Duration::seconds(i),
                )
            })
            .collect();

        let params = ListNotesParams::first_page().per_page(2);
        let page = NotesPage::select(&notes, &params);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.notes[0].id.as_str(), "n-4");
        assert_eq!(page.notes[1].id.as_str(), "n-3");

        let page = NotesPage::select(&notes, &params.clone().page(3));
        assert_eq!(page.notes.len(), 1);
        assert_eq!(page.notes[0].id.as_str(), "n-0");

        let page = NotesPage::select(&notes, &params.clone().tag(Some(NoteTag::Work)));
        assert_eq!(page.total_pages, 2);
        assert!(page.notes.iter().all(|n| n.tag == NoteTag::Work));

        let page = NotesPage::select(&notes, &params.clone().search("note 1"));
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.notes[0].id.as_str(), "n-1");

        let page = NotesPage::select(&notes, &params.page(9));
        assert!(page.is_empty());
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn matches_search_ignores_case() {
        let note = sample_note();
        assert!(note.matches_search("MILK"));
        assert!(note.matches_search("skimmed"));
        assert!(!note.matches_search("bread"));
    }
}
