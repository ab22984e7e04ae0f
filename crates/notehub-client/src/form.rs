//! Note creation form.
//!
//! ```text
//! Editing --submit(valid)--> Submitting --ok--> Closed
//!    ^                            |
//!    +-----------error------------+
//! ```
//!
//! Invalid values never leave `Editing` and never reach the API.

use std::collections::BTreeSet;
use std::sync::Arc;

use notehub_core::{Field, FieldErrors, Note, NoteFormValues, NoteTag};
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::NotesApi;
use crate::error::ClientError;
use crate::notes::NotesQueries;
use crate::notify::Toaster;
use crate::query::{Mutation, MutationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormPhase {
    Editing,
    Submitting,
    Closed,
}

/// Result of `NoteForm::submit`.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid(FieldErrors),
    /// The note was created and the form closed.
    Created(Note),
    /// The server rejected the note; values are kept.
    Failed(Arc<ClientError>),
    /// The form was not in `Editing`.
    Ignored,
}

/// What a front end draws for the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteFormScreen {
    pub values: NoteFormValues,
    /// Errors of touched fields, or of every field after a failed submit.
    pub errors: FieldErrors,
    pub phase: FormPhase,
    pub is_submitting: bool,
}

#[derive(Debug)]
pub struct NoteForm {
    default_tag: NoteTag,
    values: NoteFormValues,
    touched: BTreeSet<Field>,
    phase: FormPhase,
    mutation: Mutation<Note>,
}

impl NoteForm {
    /// A blank form with `default_tag` preselected.
    pub fn new(default_tag: NoteTag) -> Self {
        Self {
            default_tag,
            values: NoteFormValues::with_tag(default_tag),
            touched: BTreeSet::new(),
            phase: FormPhase::Editing,
            mutation: Mutation::new(),
        }
    }

    pub fn values(&self) -> &NoteFormValues {
        &self.values
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn mutation_status(&self) -> MutationStatus {
        self.mutation.status()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.values.title = title.into();
        self.touched.insert(Field::Title);
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.values.content = content.into();
        self.touched.insert(Field::Content);
    }

    /// Sets the tag from its raw text, as a select input would.
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.values.tag = tag.into();
        self.touched.insert(Field::Tag);
    }

    /// Inline errors of the fields edited so far.
    pub fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for field in &self.touched {
            if let Some(message) = self.values.validate_field(*field) {
                errors.insert(*field, message);
            }
        }
        errors
    }

    pub fn screen(&self) -> NoteFormScreen {
        NoteFormScreen {
            values: self.values.clone(),
            errors: self.errors(),
            phase: self.phase,
            is_submitting: self.phase == FormPhase::Submitting,
        }
    }

    /// Validates and, if valid, creates the note.
    ///
    /// On success the fields are cleared, the form closes, and a success
    /// toast is shown. On failure the values stay and the server message is
    /// shown as an error toast.
    pub async fn submit<A: NotesApi>(&mut self, queries: &NotesQueries<A>, toaster: &Toaster) -> SubmitOutcome {
        if self.phase != FormPhase::Editing {
            return SubmitOutcome::Ignored;
        }

        let payload = match self.values.validate() {
            Ok(payload) => payload,
            Err(errors) => {
                self.touched.extend([Field::Title, Field::Content, Field::Tag]);
                debug!(errors = %errors, "note form is invalid");
                return SubmitOutcome::Invalid(errors);
            }
        };

        self.phase = FormPhase::Submitting;
        match self.mutation.mutate(queries.create_note(&payload)).await {
            Ok(note) => {
                toaster.success(format!("The note {} has been created.", note.title));
                self.clear_fields();
                self.phase = FormPhase::Closed;
                SubmitOutcome::Created(Note::clone(&note))
            }
            Err(error) => {
                warn!(error = %error, "note creation failed");
                toaster.error(error.user_message());
                self.phase = FormPhase::Editing;
                SubmitOutcome::Failed(error)
            }
        }
    }

    /// Closes without sending anything.
    pub fn cancel(&mut self) {
        if self.phase == FormPhase::Editing {
            self.phase = FormPhase::Closed;
        }
    }

    /// Back to a blank, open form.
    pub fn reset(&mut self) {
        self.clear_fields();
        self.mutation.reset();
        self.phase = FormPhase::Editing;
    }

    fn clear_fields(&mut self) {
        self.values = NoteFormValues::with_tag(self.default_tag);
        self.touched.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToastKind;
    use crate::query::QueryClient;
    use crate::testing::MockNotesApi;
    use notehub_core::validation::TITLE_TOO_SHORT;

    fn setup(api: MockNotesApi) -> (Arc<MockNotesApi>, NotesQueries<MockNotesApi>, Toaster) {
        let api = Arc::new(api);
        let queries = NotesQueries::new(Arc::clone(&api), QueryClient::new());
        (api, queries, Toaster::new())
    }

    #[test]
    fn starts_with_default_tag() {
        let form = NoteForm::new(NoteTag::Work);
        assert_eq!(form.values().tag, "Work");
        assert_eq!(form.phase(), FormPhase::Editing);
        assert!(form.errors().is_empty());
    }

    #[test]
    fn inline_errors_follow_touched_fields() {
        let mut form = NoteForm::new(NoteTag::Todo);
        form.set_title("ab");
        let errors = form.errors();
        assert_eq!(errors.get(Field::Title), Some(TITLE_TOO_SHORT));
        assert_eq!(errors.len(), 1);

        form.set_title("abc");
        assert!(form.errors().is_empty());
    }

    #[tokio::test]
    async fn short_title_never_reaches_the_api() {
        let (api, queries, toaster) = setup(MockNotesApi::new());
        let mut form = NoteForm::new(NoteTag::Todo);
        form.set_title("ab");

        let outcome = form.submit(&queries, &toaster).await;
        match outcome {
            SubmitOutcome::Invalid(errors) => {
                assert_eq!(errors.get(Field::Title), Some("Name must be at least 3 characters"));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
        assert_eq!(api.creates(), 0);
        assert_eq!(form.phase(), FormPhase::Editing);
        assert!(toaster.recent().is_empty());
    }

    #[tokio::test]
    async fn valid_submit_closes_clears_and_toasts() {
        let (api, queries, toaster) = setup(MockNotesApi::new());
        let mut form = NoteForm::new(NoteTag::Todo);
        form.set_title("Buy milk");
        form.set_content("");
        form.set_tag("Shopping");

        let outcome = form.submit(&queries, &toaster).await;
        let SubmitOutcome::Created(note) = outcome else {
            panic!("expected Created");
        };
        assert_eq!(note.tag, NoteTag::Shopping);
        assert_eq!(api.creates(), 1);
        assert_eq!(form.phase(), FormPhase::Closed);
        assert_eq!(form.values().title, "");
        assert_eq!(form.values().tag, "Todo");
        assert_eq!(form.mutation_status(), MutationStatus::Success);

        let toasts = toaster.recent();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].kind, ToastKind::Success);
        assert_eq!(toasts[0].message, "The note Buy milk has been created.");
    }

    #[tokio::test]
    async fn server_rejection_keeps_values() {
        let api = MockNotesApi::new();
        api.reject_create(Some("Title must be unique"));
        let (_api, queries, toaster) = setup(api);

        let mut form = NoteForm::new(NoteTag::Todo);
        form.set_title("Groceries");

        let outcome = form.submit(&queries, &toaster).await;
        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.values().title, "Groceries");
        assert_eq!(form.mutation_status(), MutationStatus::Error);
        assert_eq!(toaster.recent()[0].message, "Title must be unique");
        assert_eq!(toaster.recent()[0].kind, ToastKind::Error);
    }

    #[tokio::test]
    async fn closed_form_ignores_submit() {
        let (api, queries, toaster) = setup(MockNotesApi::new());
        let mut form = NoteForm::new(NoteTag::Todo);
        form.set_title("Plan trip");
        form.cancel();

        assert!(matches!(form.submit(&queries, &toaster).await, SubmitOutcome::Ignored));
        assert_eq!(api.creates(), 0);

        form.reset();
        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.values().title, "");
    }
}
