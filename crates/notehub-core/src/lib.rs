//! notehub-core: Core types for NoteHub
//!
//! This crate provides:
//! - Note domain types (Note, NoteTag, NoteId, NotesPage)
//! - Listing parameters and the creation payload
//! - The note form validation schema, shared by client and server

pub mod types;
pub mod validation;

// Re-export commonly used types at crate root for convenience
pub use types::{
    CreateNotePayload, DEFAULT_PER_PAGE, ListNotesParams, Note, NoteId, NoteIdParseError, NoteTag,
    NoteTagParseError, NotesPage,
};
pub use validation::{Field, FieldErrors, NoteFormValues, validate_payload};
