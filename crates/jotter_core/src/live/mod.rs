//! Observable note cache.
//!
//! # Responsibility
//! - Run note mutations off the caller's thread.
//! - Republish list snapshots to observers after every mutation.
//!
//! # Invariants
//! - Snapshots are published in mutation order.
//! - Observers never see a list older than the one they already hold.

pub mod note_feed;

pub use note_feed::{FeedError, NoteFeed, NoteSnapshot};
