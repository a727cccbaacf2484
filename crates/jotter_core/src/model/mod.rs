//! Domain model for notes and the cached signed-in user.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep list ordering rules next to the record they order.
//!
//! # Invariants
//! - Every stored note is identified by a storage-issued `NoteId`.
//! - At most one `User` is cached locally at a time.

pub mod note;
pub mod user;
