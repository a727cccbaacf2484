//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide note CRUD plus the three list projections (default, archived,
//!   search) on top of the `notes` table.
//! - Keep list ordering in SQL so every caller sees the same order.
//!
//! # Invariants
//! - Default list: `is_archived = 0`, ordered pinned first, then
//!   `modified_at DESC, id DESC`.
//! - Archived list: `is_archived = 1`, ordered `modified_at DESC, id DESC`.
//! - Ids are issued by `AUTOINCREMENT` and never reused; `restore_note`
//!   re-inserts under the original id.

use crate::model::note::{NewNoteRow, Note, NoteColor, NoteId};
use crate::repo::{bool_to_int, int_to_bool, RepoError, RepoResult};
use crate::search::{like_pattern, normalize_query};
use rusqlite::{params, Connection, Row};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    created_at,
    modified_at,
    is_archived,
    is_pinned,
    color
FROM notes";

const DEFAULT_ORDER_SQL: &str = "ORDER BY is_pinned DESC, modified_at DESC, id DESC";

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Inserts a new note and returns the storage-issued id.
    fn insert_note(&self, row: &NewNoteRow) -> RepoResult<NoteId>;
    /// Inserts or replaces a note keeping its id. Used to undo deletions.
    fn restore_note(&self, note: &Note) -> RepoResult<()>;
    /// Replaces every mutable column of an existing note.
    fn update_note(&self, note: &Note) -> RepoResult<()>;
    /// Removes a note row.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Non-archived notes in default-list order.
    fn list_active(&self) -> RepoResult<Vec<Note>>;
    /// Archived notes, newest modification first.
    fn list_archived(&self) -> RepoResult<Vec<Note>>;
    /// Case-insensitive substring search over title or content.
    fn search_notes(&self, query: &str) -> RepoResult<Vec<Note>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_notes(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, row: &NewNoteRow) -> RepoResult<NoteId> {
        self.conn.execute(
            "INSERT INTO notes (
                title,
                content,
                created_at,
                modified_at,
                is_archived,
                is_pinned,
                color
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                row.title.as_str(),
                row.content.as_str(),
                row.created_at,
                row.modified_at,
                bool_to_int(row.is_archived),
                bool_to_int(row.is_pinned),
                row.color.map(color_to_db),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn restore_note(&self, note: &Note) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO notes (
                id,
                title,
                content,
                created_at,
                modified_at,
                is_archived,
                is_pinned,
                color
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                note.id,
                note.title.as_str(),
                note.content.as_str(),
                note.created_at,
                note.modified_at,
                bool_to_int(note.is_archived),
                bool_to_int(note.is_pinned),
                note.color.map(color_to_db),
            ],
        )?;
        Ok(())
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                created_at = ?4,
                modified_at = ?5,
                is_archived = ?6,
                is_pinned = ?7,
                color = ?8
             WHERE id = ?1;",
            params![
                note.id,
                note.title.as_str(),
                note.content.as_str(),
                note.created_at,
                note.modified_at,
                bool_to_int(note.is_archived),
                bool_to_int(note.is_pinned),
                note.color.map(color_to_db),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(note.id));
        }
        Ok(())
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    fn list_active(&self) -> RepoResult<Vec<Note>> {
        self.query_notes(
            &format!("{NOTE_SELECT_SQL} WHERE is_archived = 0 {DEFAULT_ORDER_SQL};"),
            [],
        )
    }

    fn list_archived(&self) -> RepoResult<Vec<Note>> {
        self.query_notes(
            &format!(
                "{NOTE_SELECT_SQL} WHERE is_archived = 1 ORDER BY modified_at DESC, id DESC;"
            ),
            [],
        )
    }

    fn search_notes(&self, query: &str) -> RepoResult<Vec<Note>> {
        let Some(needle) = normalize_query(query) else {
            return Ok(Vec::new());
        };
        let pattern = like_pattern(&needle);
        self.query_notes(
            &format!(
                "{NOTE_SELECT_SQL}
                 WHERE title LIKE ?1 ESCAPE '\\'
                    OR content LIKE ?1 ESCAPE '\\'
                 {DEFAULT_ORDER_SQL};"
            ),
            [pattern],
        )
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let color = match row.get::<_, Option<i64>>("color")? {
        Some(value) => Some(color_from_db(value)?),
        None => None,
    };

    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
        is_archived: int_to_bool(row.get("is_archived")?, "notes.is_archived")?,
        is_pinned: int_to_bool(row.get("is_pinned")?, "notes.is_pinned")?,
        color,
    })
}

fn color_to_db(color: NoteColor) -> i64 {
    i64::from(color.argb())
}

fn color_from_db(value: i64) -> RepoResult<NoteColor> {
    u32::try_from(value)
        .map(NoteColor)
        .map_err(|_| RepoError::InvalidData(format!("invalid color value `{value}` in notes.color")))
}
