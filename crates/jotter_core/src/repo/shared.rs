//! Thread-shareable connection handle.
//!
//! # Responsibility
//! - Let owners on worker threads (feed, FFI) reuse one migrated connection.
//! - Implement the repository traits by delegating to the borrowed SQLite
//!   repositories under a lock.
//!
//! # Invariants
//! - Every statement runs while holding the lock, so `last_insert_rowid`
//!   always belongs to the caller's insert.

use crate::model::note::{NewNoteRow, Note, NoteId};
use crate::model::user::User;
use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::{RepoError, RepoResult};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Cloneable handle to a single SQLite connection.
#[derive(Clone)]
pub struct SharedConnection {
    inner: Arc<Mutex<Connection>>,
}

impl SharedConnection {
    pub fn new(conn: Connection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> RepoResult<T>) -> RepoResult<T> {
        let guard = self.inner.lock().map_err(|_| RepoError::LockPoisoned)?;
        f(&guard)
    }
}

impl NoteRepository for SharedConnection {
    fn insert_note(&self, row: &NewNoteRow) -> RepoResult<NoteId> {
        self.with_conn(|conn| SqliteNoteRepository::new(conn).insert_note(row))
    }

    fn restore_note(&self, note: &Note) -> RepoResult<()> {
        self.with_conn(|conn| SqliteNoteRepository::new(conn).restore_note(note))
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        self.with_conn(|conn| SqliteNoteRepository::new(conn).update_note(note))
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        self.with_conn(|conn| SqliteNoteRepository::new(conn).delete_note(id))
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.with_conn(|conn| SqliteNoteRepository::new(conn).get_note(id))
    }

    fn list_active(&self) -> RepoResult<Vec<Note>> {
        self.with_conn(|conn| SqliteNoteRepository::new(conn).list_active())
    }

    fn list_archived(&self) -> RepoResult<Vec<Note>> {
        self.with_conn(|conn| SqliteNoteRepository::new(conn).list_archived())
    }

    fn search_notes(&self, query: &str) -> RepoResult<Vec<Note>> {
        self.with_conn(|conn| SqliteNoteRepository::new(conn).search_notes(query))
    }
}

impl UserRepository for SharedConnection {
    fn upsert_user(&self, user: &User) -> RepoResult<()> {
        self.with_conn(|conn| SqliteUserRepository::new(conn).upsert_user(user))
    }

    fn current_user(&self) -> RepoResult<Option<User>> {
        self.with_conn(|conn| SqliteUserRepository::new(conn).current_user())
    }

    fn clear_users(&self) -> RepoResult<()> {
        self.with_conn(|conn| SqliteUserRepository::new(conn).clear_users())
    }
}
