//! Single-slot buffer holding the most recently deleted note.
//!
//! # Invariants
//! - Holds at most one note; `remember` overwrites any previous occupant.
//! - `take` empties the slot, so a note is restorable exactly once.

use crate::model::note::Note;

#[derive(Debug, Default)]
pub struct UndoBuffer {
    slot: Option<Note>,
}

impl UndoBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `note`, dropping whatever was buffered before.
    pub fn remember(&mut self, note: Note) {
        self.slot = Some(note);
    }

    pub fn peek(&self) -> Option<&Note> {
        self.slot.as_ref()
    }

    pub fn take(&mut self) -> Option<Note> {
        self.slot.take()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_available(&self) -> bool {
        self.slot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::UndoBuffer;
    use crate::model::note::Note;

    fn note(id: i64) -> Note {
        Note {
            id,
            title: String::new(),
            content: format!("body {id}"),
            created_at: 1,
            modified_at: 1,
            is_archived: false,
            is_pinned: false,
            color: None,
        }
    }

    #[test]
    fn second_remember_overwrites_first() {
        let mut buffer = UndoBuffer::new();
        buffer.remember(note(1));
        buffer.remember(note(2));
        assert_eq!(buffer.take().map(|n| n.id), Some(2));
        assert!(buffer.take().is_none());
    }

    #[test]
    fn clear_drops_buffered_note() {
        let mut buffer = UndoBuffer::new();
        buffer.remember(note(7));
        assert!(buffer.is_available());
        buffer.clear();
        assert!(!buffer.is_available());
        assert!(buffer.peek().is_none());
    }
}
