//! Note domain model.
//!
//! # Responsibility
//! - Define the note record shared by list, archive and search views.
//! - Provide the default-list ordering and the color palette.
//!
//! # Invariants
//! - `id` is issued by storage, strictly increasing, never reused.
//! - `modified_at >= created_at` for every write issued by core.
//! - A note with both title and content blank is never created.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-issued note identifier.
pub type NoteId = i64;

/// Display color for a note, stored as 32-bit ARGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteColor(pub u32);

impl NoteColor {
    pub const GREENISH_BLUE: Self = Self(0xFF4E_CDC4);
    pub const LIGHT_YELLOW: Self = Self(0xFFFF_F9C4);
    pub const LIGHT_PINK: Self = Self(0xFFF8_BBD0);
    pub const LIGHT_BLUE: Self = Self(0xFFBB_DEFB);
    pub const LIGHT_GREEN: Self = Self(0xFFDC_EDC8);
    pub const LIGHT_ORANGE: Self = Self(0xFFFF_E0B2);
    pub const LIGHT_PURPLE: Self = Self(0xFFE1_BEE7);
    pub const LIGHT_TEAL: Self = Self(0xFFB2_DFDB);
    pub const LIGHT_RED: Self = Self(0xFFFF_CDD2);
    pub const LIGHT_CYAN: Self = Self(0xFFB2_EBF2);
    pub const LIGHT_BROWN: Self = Self(0xFFD7_CCC8);
    pub const LIGHT_GREY: Self = Self(0xFFF5_F5F5);
    pub const LIGHT_LIME: Self = Self(0xFFF0_F4C3);
    pub const LIGHT_INDIGO: Self = Self(0xFFC5_CAE9);

    /// Colors offered by the editor, default first.
    pub const PALETTE: [Self; 14] = [
        Self::GREENISH_BLUE,
        Self::LIGHT_YELLOW,
        Self::LIGHT_PINK,
        Self::LIGHT_BLUE,
        Self::LIGHT_GREEN,
        Self::LIGHT_ORANGE,
        Self::LIGHT_PURPLE,
        Self::LIGHT_TEAL,
        Self::LIGHT_RED,
        Self::LIGHT_CYAN,
        Self::LIGHT_BROWN,
        Self::LIGHT_GREY,
        Self::LIGHT_LIME,
        Self::LIGHT_INDIGO,
    ];

    /// Returns the raw ARGB value.
    pub fn argb(self) -> u32 {
        self.0
    }

    /// Whether text drawn on this color should be light for contrast.
    ///
    /// Uses the `0.299 R + 0.587 G + 0.114 B` luminance approximation.
    pub fn is_dark(self) -> bool {
        let [_, r, g, b] = self.0.to_be_bytes();
        let luminance = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
        luminance < 127.5
    }
}

impl Default for NoteColor {
    fn default() -> Self {
        Self::GREENISH_BLUE
    }
}

/// Persisted note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Advanced on every mutating write.
    pub modified_at: i64,
    pub is_archived: bool,
    pub is_pinned: bool,
    pub color: Option<NoteColor>,
}

impl Note {
    /// Whether this note belongs to the default (non-archived) list.
    pub fn is_active(&self) -> bool {
        !self.is_archived
    }

    /// Case-insensitive substring match over title or content.
    ///
    /// Folds ASCII case only, the same way SQLite `LIKE` does, so cached
    /// snapshots filter exactly like the storage search.
    pub fn matches_text(&self, needle: &str) -> bool {
        if needle.trim().is_empty() {
            return false;
        }
        let needle = needle.to_ascii_lowercase();
        self.title.to_ascii_lowercase().contains(&needle)
            || self.content.to_ascii_lowercase().contains(&needle)
    }
}

/// Ordering of the default list: pinned first, then newest modification.
///
/// Ties fall back to `id` descending so the order is total.
pub fn default_list_order(a: &Note, b: &Note) -> Ordering {
    b.is_pinned
        .cmp(&a.is_pinned)
        .then_with(|| b.modified_at.cmp(&a.modified_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// Creation input for a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub color: Option<NoteColor>,
}

impl NewNote {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            color: None,
        }
    }

    /// Sets the display color.
    pub fn with_color(mut self, color: NoteColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Rejects drafts that carry no text at all.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.trim().is_empty() && self.content.trim().is_empty() {
            return Err(NoteValidationError::EmptyNote);
        }
        Ok(())
    }

    /// Builds the record to persist, stamping both timestamps with `now_ms`.
    pub fn into_row(self, now_ms: i64) -> NewNoteRow {
        NewNoteRow {
            title: self.title,
            content: self.content,
            created_at: now_ms,
            modified_at: now_ms,
            is_archived: false,
            is_pinned: false,
            color: self.color,
        }
    }
}

/// A fully stamped note that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNoteRow {
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub modified_at: i64,
    pub is_archived: bool,
    pub is_pinned: bool,
    pub color: Option<NoteColor>,
}

impl NewNoteRow {
    /// Attaches the storage-issued id.
    pub fn with_id(self, id: NoteId) -> Note {
        Note {
            id,
            title: self.title,
            content: self.content,
            created_at: self.created_at,
            modified_at: self.modified_at,
            is_archived: self.is_archived,
            is_pinned: self.is_pinned,
            color: self.color,
        }
    }
}

/// Validation failure for note input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Both title and content are blank.
    EmptyNote,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyNote => write!(f, "note must have a title or content"),
        }
    }
}

impl Error for NoteValidationError {}
