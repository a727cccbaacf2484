//! Text search helpers shared by storage and cached snapshots.
//!
//! # Responsibility
//! - Normalize user query text.
//! - Build `LIKE` patterns that match the query literally.

pub mod text;

pub use text::{like_pattern, normalize_query};
