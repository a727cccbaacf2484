//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod auth_service;
pub mod local_identity;
pub mod note_service;
pub mod undo;
