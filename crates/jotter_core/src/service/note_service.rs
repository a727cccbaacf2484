//! Note use-case service.
//!
//! # Responsibility
//! - Create, edit, pin, archive and delete notes through a repository.
//! - Stamp `modified_at` from the injected clock on every mutating write.
//! - Keep the one-slot undo buffer for deletions.
//!
//! # Invariants
//! - `update_note`, `toggle_pin` and `toggle_archive` always write
//!   `modified_at = clock.now_ms()`.
//! - A deleted note sits in the undo buffer until the next delete, an
//!   undo, or `clear_undo`.
//! - `undo_delete` re-inserts the note under its original id.

use crate::clock::{Clock, SystemClock};
use crate::model::note::{NewNote, Note, NoteId, NoteValidationError};
use crate::repo::note_repo::NoteRepository;
use crate::repo::{RepoError, RepoResult};
use crate::service::undo::UndoBuffer;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Input rejected before reaching storage.
    Validation(NoteValidationError),
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NoteNotFound(_) => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Note manager over a repository implementation.
pub struct NoteService<R: NoteRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
    undo: UndoBuffer,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service stamping times from the system clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: NoteRepository, C: Clock> NoteService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self {
            repo,
            clock,
            undo: UndoBuffer::new(),
        }
    }

    /// Borrows the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Persists a new note with `created_at = modified_at = now`.
    pub fn create_note(&self, draft: NewNote) -> NoteServiceResult<Note> {
        draft.validate()?;
        let row = draft.into_row(self.clock.now_ms());
        let id = self.repo.insert_note(&row)?;
        debug!("event=note_create module=service status=ok note_id={id}");
        Ok(row.with_id(id))
    }

    /// Writes every field of `note`, advancing `modified_at` to now.
    pub fn update_note(&self, note: Note) -> NoteServiceResult<Note> {
        let updated = Note {
            modified_at: self.clock.now_ms(),
            ..note
        };
        self.repo.update_note(&updated)?;
        debug!(
            "event=note_update module=service status=ok note_id={}",
            updated.id
        );
        Ok(updated)
    }

    /// Flips the pinned flag.
    pub fn toggle_pin(&self, id: NoteId) -> NoteServiceResult<Note> {
        let note = self.require_note(id)?;
        self.update_note(Note {
            is_pinned: !note.is_pinned,
            ..note
        })
    }

    /// Flips the archived flag, moving the note between default and
    /// archived lists.
    pub fn toggle_archive(&self, id: NoteId) -> NoteServiceResult<Note> {
        let note = self.require_note(id)?;
        self.update_note(Note {
            is_archived: !note.is_archived,
            ..note
        })
    }

    /// Deletes a note and keeps it in the undo buffer.
    ///
    /// Any note already buffered is dropped for good.
    pub fn delete_note(&mut self, id: NoteId) -> NoteServiceResult<Note> {
        let note = self.require_note(id)?;
        self.repo.delete_note(id)?;
        if let Some(dropped) = self.undo.peek() {
            debug!(
                "event=undo_overwrite module=service status=ok dropped_note_id={}",
                dropped.id
            );
        }
        self.undo.remember(note.clone());
        info!("event=note_delete module=service status=ok note_id={id}");
        Ok(note)
    }

    /// Restores the most recently deleted note, if any.
    ///
    /// The buffer is emptied only after storage accepted the note, so a
    /// failed restore can be retried.
    pub fn undo_delete(&mut self) -> NoteServiceResult<Option<Note>> {
        let Some(note) = self.undo.peek() else {
            return Ok(None);
        };
        self.repo.restore_note(note)?;
        let restored = self.undo.take();
        if let Some(note) = restored.as_ref() {
            info!(
                "event=note_undo_delete module=service status=ok note_id={}",
                note.id
            );
        }
        Ok(restored)
    }

    /// Forgets the buffered note without restoring it.
    pub fn clear_undo(&mut self) {
        self.undo.clear();
    }

    pub fn undo_available(&self) -> bool {
        self.undo.is_available()
    }

    pub fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.repo.get_note(id)
    }

    /// Default list: non-archived, pinned first, newest first.
    pub fn list_notes(&self) -> RepoResult<Vec<Note>> {
        self.repo.list_active()
    }

    pub fn list_archived(&self) -> RepoResult<Vec<Note>> {
        self.repo.list_archived()
    }

    pub fn search_notes(&self, query: &str) -> RepoResult<Vec<Note>> {
        self.repo.search_notes(query)
    }

    fn require_note(&self, id: NoteId) -> NoteServiceResult<Note> {
        self.repo
            .get_note(id)?
            .ok_or(NoteServiceError::NoteNotFound(id))
    }
}
