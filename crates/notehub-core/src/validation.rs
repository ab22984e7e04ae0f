//! Validation schema for the note creation form.
//!
//! Field values arrive as raw text (the tag comes from a select box), and
//! validation turns them into a `CreateNotePayload` or a set of per-field
//! messages. The server runs the same schema on POST bodies.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{CreateNotePayload, NoteTag};

/// Minimum title length, in characters.
pub const TITLE_MIN_CHARS: usize = 3;

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 50;

/// Maximum content length, in characters.
pub const CONTENT_MAX_CHARS: usize = 500;

pub const TITLE_REQUIRED: &str = "Name is required";
pub const TITLE_TOO_SHORT: &str = "Name must be at least 3 characters";
pub const TITLE_TOO_LONG: &str = "Name is too long";
pub const CONTENT_TOO_LONG: &str = "Content is too long";
pub const TAG_REQUIRED: &str = "Tag is required";
pub const TAG_UNKNOWN: &str = "Tag must be one of: Work, Personal, Meeting, Shopping, Todo";

/// A field of the note form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Content,
    Tag,
}

impl Field {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Content => "content",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field validation messages. At most one message per field: the first
/// rule the field fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for a field unless one is already recorded.
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Returns the message for a field, if any.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Raw values of the note creation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFormValues {
    pub title: String,
    pub content: String,
    pub tag: String,
}

impl NoteFormValues {
    /// Empty title and content, with the given tag preselected.
    #[must_use]
    pub fn with_tag(tag: NoteTag) -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            tag: tag.as_str().to_string(),
        }
    }

    /// Checks a single field, returning its message if it fails.
    #[must_use]
    pub fn validate_field(&self, field: Field) -> Option<&'static str> {
        match field {
            Field::Title => validate_title(&self.title),
            Field::Content => validate_content(&self.content),
            Field::Tag => validate_tag(&self.tag).err(),
        }
    }

    /// Validates every field, producing the request payload on success.
    pub fn validate(&self) -> Result<CreateNotePayload, FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Some(msg) = validate_title(&self.title) {
            errors.insert(Field::Title, msg);
        }
        if let Some(msg) = validate_content(&self.content) {
            errors.insert(Field::Content, msg);
        }
        let tag = match validate_tag(&self.tag) {
            Ok(tag) => Some(tag),
            Err(msg) => {
                errors.insert(Field::Tag, msg);
                None
            }
        };

        match tag {
            Some(tag) if errors.is_empty() => Ok(CreateNotePayload {
                title: self.title.clone(),
                content: self.content.clone(),
                tag,
            }),
            _ => Err(errors),
        }
    }
}

impl Default for NoteFormValues {
    fn default() -> Self {
        Self::with_tag(NoteTag::default())
    }
}

impl From<&CreateNotePayload> for NoteFormValues {
    fn from(payload: &CreateNotePayload) -> Self {
        Self {
            title: payload.title.clone(),
            content: payload.content.clone(),
            tag: payload.tag.as_str().to_string(),
        }
    }
}

/// Validates a payload that arrived already typed (server side).
pub fn validate_payload(payload: &CreateNotePayload) -> Result<(), FieldErrors> {
    NoteFormValues::from(payload).validate().map(|_| ())
}

fn validate_title(title: &str) -> Option<&'static str> {
    let len = title.chars().count();
    if len == 0 {
        Some(TITLE_REQUIRED)
    } else if len < TITLE_MIN_CHARS {
        Some(TITLE_TOO_SHORT)
    } else if len > TITLE_MAX_CHARS {
        Some(TITLE_TOO_LONG)
    } else {
        None
    }
}

fn validate_content(content: &str) -> Option<&'static str> {
    (content.chars().count() > CONTENT_MAX_CHARS).then_some(CONTENT_TOO_LONG)
}

fn validate_tag(tag: &str) -> Result<NoteTag, &'static str> {
    if tag.is_empty() {
        return Err(TAG_REQUIRED);
    }
    tag.parse().map_err(|_| TAG_UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(title: &str, content: &str, tag: &str) -> NoteFormValues {
        NoteFormValues {
            title: title.to_string(),
            content: content.to_string(),
            tag: tag.to_string(),
        }
    }

    #[test]
    fn two_character_title_is_too_short() {
        let errors = values("ab", "", "Work").validate().unwrap_err();
        assert_eq!(errors.get(Field::Title), Some(TITLE_TOO_SHORT));
        assert_eq!(errors.get(Field::Title), Some("Name must be at least 3 characters"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn empty_title_is_required() {
        let errors = values("", "", "Work").validate().unwrap_err();
        assert_eq!(errors.get(Field::Title), Some(TITLE_REQUIRED));
    }

    #[test]
    fn title_bounds_are_inclusive() {
        assert!(values("abc", "", "Todo").validate().is_ok());
        assert!(values(&"x".repeat(50), "", "Todo").validate().is_ok());

        let errors = values(&"x".repeat(51), "", "Todo").validate().unwrap_err();
        assert_eq!(errors.get(Field::Title), Some(TITLE_TOO_LONG));
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        // three characters, nine bytes
        assert!(values("日本語", "", "Work").validate().is_ok());
    }

    #[test]
    fn content_is_optional_but_bounded() {
        assert!(values("Buy milk", "", "Shopping").validate().is_ok());
        assert!(values("Buy milk", &"c".repeat(500), "Shopping").validate().is_ok());

        let errors = values("Buy milk", &"c".repeat(501), "Shopping")
            .validate()
            .unwrap_err();
        assert_eq!(errors.get(Field::Content), Some(CONTENT_TOO_LONG));
    }

    #[test]
    fn tag_must_be_known() {
        let errors = values("Buy milk", "", "").validate().unwrap_err();
        assert_eq!(errors.get(Field::Tag), Some(TAG_REQUIRED));

        let errors = values("Buy milk", "", "Groceries").validate().unwrap_err();
        assert_eq!(errors.get(Field::Tag), Some(TAG_UNKNOWN));
    }

    #[test]
    fn every_failing_field_is_reported() {
        let errors = values("a", &"c".repeat(600), "nope").validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.to_string(),
            format!("title: {}; content: {}; tag: {}", TITLE_TOO_SHORT, CONTENT_TOO_LONG, TAG_UNKNOWN)
        );
    }

    #[test]
    fn valid_values_produce_payload() {
        let payload = values("Buy milk", "", "Shopping").validate().unwrap();
        assert_eq!(payload.title, "Buy milk");
        assert_eq!(payload.content, "");
        assert_eq!(payload.tag, NoteTag::Shopping);
    }

    #[test]
    fn validate_field_checks_one_field() {
        let form = values("ab", &"c".repeat(600), "Work");
        assert_eq!(form.validate_field(Field::Title), Some(TITLE_TOO_SHORT));
        assert_eq!(form.validate_field(Field::Content), Some(CONTENT_TOO_LONG));
        assert_eq!(form.validate_field(Field::Tag), None);
    }

    #[test]
    fn default_values_preselect_todo() {
        let form = NoteFormValues::default();
        assert_eq!(form.tag, "Todo");
        assert!(form.title.is_empty());
    }

    #[test]
    fn field_errors_serialize_as_object() {
        let errors = values("ab", "", "Work").validate().unwrap_err();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["title"], TITLE_TOO_SHORT);
    }
}
