//! Note book use-cases.
//!
//! # Responsibility
//! - Own the in-memory note list and write it through on every mutation.
//!
//! # Invariants
//! - Notes are ordered most-recent-first.
//! - Only creatable note types are accepted on create/edit.
//! - Deletes require an explicit confirmation step.

use crate::clock::{next_record_id, Clock, SystemClock};
use crate::model::note::{Note, NoteId, NoteType, NoteValidationError};
use crate::service::pending_delete::DeleteConfirmation;
use crate::storage::local_store::{load_json, save_json, LocalStore, StoreError, NOTES_KEY};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type NoteResult<T> = Result<T, NoteServiceError>;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    Validation(NoteValidationError),
    NotFound(NoteId),
    NoPendingDelete,
    Store(StoreError),
}

impl NoteServiceError {
    /// Arabic message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.user_message(),
            Self::NotFound(_) => "الملاحظة غير موجودة",
            Self::NoPendingDelete => "لا توجد ملاحظة بانتظار تأكيد الحذف",
            Self::Store(_) => "حدث خطأ أثناء حفظ البيانات",
        }
    }
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::NoPendingDelete => write!(f, "no note is pending deletion"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for NoteServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Notes data layer over a local store.
pub struct NoteBook<S: LocalStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    notes: Vec<Note>,
    pending_delete: DeleteConfirmation<NoteId>,
}

impl<S: LocalStore> NoteBook<S, SystemClock> {
    pub fn open(store: S) -> NoteResult<Self> {
        Self::open_with_clock(store, SystemClock)
    }
}

impl<S: LocalStore, C: Clock> NoteBook<S, C> {
    pub fn open_with_clock(store: S, clock: C) -> NoteResult<Self> {
        let notes: Vec<Note> = load_json(&store, NOTES_KEY)?.unwrap_or_default();
        info!(
            "event=note_book_load module=note status=ok notes={}",
            notes.len()
        );
        Ok(Self {
            store,
            clock,
            notes,
            pending_delete: DeleteConfirmation::Idle,
        })
    }

    /// Notes, most recent first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Records a new note and prepends it.
    pub fn create(&mut self, title: &str, content: &str, kind: NoteType) -> NoteResult<Note> {
        let last_id = self.notes.iter().map(|note| note.id).max();
        let note = Note {
            id: next_record_id(&self.clock, last_id),
            title: title.trim().to_string(),
            content: content.trim().to_string(),
            kind,
            date: self.clock.today(),
        };
        note.validate()?;

        self.notes.insert(0, note.clone());
        if let Err(err) = self.persist() {
            self.notes.remove(0);
            return Err(err);
        }

        info!(
            "event=note_create module=note status=ok id={} type={} count={}",
            note.id,
            note.kind.slug(),
            self.notes.len()
        );
        Ok(note)
    }

    /// Replaces a note's fields in place and refreshes its date.
    ///
    /// Returns `Ok(None)` without touching the store when `id` is unknown.
    pub fn update(
        &mut self,
        id: NoteId,
        title: &str,
        content: &str,
        kind: NoteType,
    ) -> NoteResult<Option<Note>> {
        let Some(index) = self.notes.iter().position(|note| note.id == id) else {
            warn!("event=note_update module=note status=skipped reason=not_found id={id}");
            return Ok(None);
        };

        let updated = Note {
            id,
            title: title.trim().to_string(),
            content: content.trim().to_string(),
            kind,
            date: self.clock.today(),
        };
        updated.validate()?;

        let previous = std::mem::replace(&mut self.notes[index], updated.clone());
        if let Err(err) = self.persist() {
            self.notes[index] = previous;
            return Err(err);
        }

        info!("event=note_update module=note status=ok id={id}");
        Ok(Some(updated))
    }

    pub fn request_delete(&mut self, id: NoteId) -> NoteResult<()> {
        if self.get(id).is_none() {
            return Err(NoteServiceError::NotFound(id));
        }
        self.pending_delete.request(id);
        Ok(())
    }

    pub fn cancel_delete(&mut self) -> Option<NoteId> {
        self.pending_delete.cancel()
    }

    pub fn pending_delete(&self) -> Option<NoteId> {
        self.pending_delete.pending()
    }

    pub fn confirm_delete(&mut self) -> NoteResult<Note> {
        let id = self
            .pending_delete
            .confirm()
            .ok_or(NoteServiceError::NoPendingDelete)?;
        let index = self
            .notes
            .iter()
            .position(|note| note.id == id)
            .ok_or(NoteServiceError::NotFound(id))?;

        let removed = self.notes.remove(index);
        if let Err(err) = self.persist() {
            self.notes.insert(index, removed);
            return Err(err);
        }

        info!(
            "event=note_delete module=note status=ok id={id} count={}",
            self.notes.len()
        );
        Ok(removed)
    }

    fn persist(&self) -> NoteResult<()> {
        save_json(&self.store, NOTES_KEY, &self.notes)?;
        Ok(())
    }
}
