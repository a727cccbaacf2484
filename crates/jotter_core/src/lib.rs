//! Core domain logic for Jotter.
//! This crate is the single source of truth for note and session invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod live;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use live::{FeedError, NoteFeed, NoteSnapshot};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{
    default_list_order, NewNote, NewNoteRow, Note, NoteColor, NoteId, NoteValidationError,
};
pub use model::user::User;
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::shared::SharedConnection;
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::auth_service::{
    friendly_sign_up_message, validate_credentials, AuthFlow, AuthManager, AuthOutcome,
    IdentityProvider, ProviderError, ProviderUser, DUPLICATE_EMAIL_MESSAGE,
};
pub use service::local_identity::InMemoryIdentityProvider;
pub use service::note_service::{NoteService, NoteServiceError, NoteServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
