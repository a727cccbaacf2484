//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose note and account use-cases to Dart via FRB.
//! - Own the process-wide note feed so the cached lists and the undo slot
//!   survive between calls.
//! - Route identity results from the app's provider through the auth manager.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Mutations are non-`sync` bridge calls and run on the bridge worker
//!   pool, never on the UI isolate.
//! - All calls share one connection, one feed and one undo slot.

use jotter_core::db::open_db;
use jotter_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    validate_credentials, AuthFlow, AuthManager, AuthOutcome, FeedError, IdentityProvider,
    NewNote, Note, NoteColor, NoteFeed, NoteService, ProviderError, ProviderUser,
    SharedConnection, User,
};
use log::warn;
use std::future::Future;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

const DB_FILE_NAME: &str = "jotter.sqlite3";
const DB_PATH_ENV: &str = "JOTTER_DB_PATH";
const WORKER_THREADS: usize = 2;

static STORE: OnceLock<Store> = OnceLock::new();

struct Store {
    db_path: PathBuf,
    runtime: Runtime,
    feed: NoteFeed<SharedConnection>,
    auth: AuthManager<HostIdentityProvider, SharedConnection>,
}

/// The identity provider lives in the Flutter app; its results come back
/// through [`auth_complete`].
struct HostIdentityProvider;

impl HostIdentityProvider {
    fn unavailable() -> ProviderError {
        ProviderError::new("Sign-in is handled by the app.")
    }
}

impl IdentityProvider for HostIdentityProvider {
    fn sign_in_with_email(&self, _: &str, _: &str) -> Result<ProviderUser, ProviderError> {
        Err(Self::unavailable())
    }

    fn create_user_with_email(&self, _: &str, _: &str) -> Result<ProviderUser, ProviderError> {
        Err(Self::unavailable())
    }

    fn sign_in_with_id_token(&self, _: &str) -> Result<ProviderUser, ProviderError> {
        Err(Self::unavailable())
    }

    fn fetch_sign_in_methods(&self, _: &str) -> Result<Vec<String>, ProviderError> {
        Err(Self::unavailable())
    }

    // The app signs out of its provider before calling `user_cache_clear`.
    fn sign_out(&self) {}
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Opens the note database at `db_path`.
///
/// Must run before the first note call to take effect; afterwards only the
/// same path is accepted. Returns empty string on success.
pub fn init_database(db_path: String) -> String {
    let requested = PathBuf::from(db_path.trim());
    if requested.as_os_str().is_empty() {
        return "db_path cannot be empty".to_string();
    }
    match store_at(requested.clone()) {
        Ok(store) if store.db_path == requested => String::new(),
        Ok(store) => format!(
            "database already opened at `{}`; refusing to switch to `{}`",
            store.db_path.display(),
            requested.display()
        ),
        Err(err) => err,
    }
}

/// Note row as seen by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at_ms: i64,
    pub modified_at_ms: i64,
    pub is_archived: bool,
    pub is_pinned: bool,
    /// ARGB color; `None` means the default palette color.
    pub color: Option<u32>,
}

impl From<Note> for NoteItem {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            created_at_ms: note.created_at,
            modified_at_ms: note.modified_at,
            is_archived: note.is_archived,
            is_pinned: note.is_pinned,
            color: note.color.map(NoteColor::argb),
        }
    }
}

impl From<NoteItem> for Note {
    fn from(item: NoteItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            content: item.content,
            created_at: item.created_at_ms,
            modified_at: item.modified_at_ms,
            is_archived: item.is_archived,
            is_pinned: item.is_pinned,
            color: item.color.map(NoteColor),
        }
    }
}

/// Single-note response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    pub ok: bool,
    pub note: Option<NoteItem>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    /// Whether a deleted note is waiting in the undo slot.
    pub undo_available: bool,
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesListResponse {
    pub items: Vec<NoteItem>,
    pub message: String,
}

/// Cached signed-in user as seen by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserItem {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl From<User> for UserItem {
    fn from(user: User) -> Self {
        Self {
            uid: user.uid,
            email: user.email,
            display_name: user.display_name,
        }
    }
}

/// Sign-in flow the app ran against its provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlowItem {
    EmailSignIn,
    EmailSignUp,
    IdToken,
}

impl From<AuthFlowItem> for AuthFlow {
    fn from(flow: AuthFlowItem) -> Self {
        match flow {
            AuthFlowItem::EmailSignIn => Self::EmailSignIn,
            AuthFlowItem::EmailSignUp => Self::EmailSignUp,
            AuthFlowItem::IdToken => Self::IdToken,
        }
    }
}

/// Provider result reported by the app.
///
/// A non-blank `uid` means the provider accepted the user; otherwise
/// `error_message` carries the provider's text, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAuthResult {
    pub flow: AuthFlowItem,
    /// Address typed by the user; empty for federated sign-in.
    pub email: String,
    pub uid: Option<String>,
    pub provider_email: Option<String>,
    pub display_name: Option<String>,
    pub error_message: Option<String>,
}

/// Auth response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub success: bool,
    /// Empty on success.
    pub message: String,
}

impl From<AuthOutcome> for AuthResponse {
    fn from(outcome: AuthOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message.unwrap_or_default(),
        }
    }
}

pub fn notes_create(title: String, content: String, color: Option<u32>) -> NoteActionResponse {
    let draft = NewNote {
        title,
        content,
        color: color.map(NoteColor),
    };
    note_action("notes_create", ("Note created.", ""), |feed| async move {
        feed.create_note(draft).await.map(Some)
    })
}

/// Saves every field of `note`; `modified_at_ms` is replaced by now.
pub fn notes_update(note: NoteItem) -> NoteActionResponse {
    note_action("notes_update", ("Note updated.", ""), |feed| async move {
        feed.update_note(note.into()).await.map(Some)
    })
}

pub fn notes_get(id: i64) -> NoteActionResponse {
    note_action("notes_get", ("Note loaded.", "Note not found."), |feed| {
        feed.get_note(id)
    })
}

pub fn notes_toggle_pin(id: i64) -> NoteActionResponse {
    note_action("notes_toggle_pin", ("Pin toggled.", ""), |feed| async move {
        feed.toggle_pin(id).await.map(Some)
    })
}

pub fn notes_toggle_archive(id: i64) -> NoteActionResponse {
    note_action("notes_toggle_archive", ("Archive toggled.", ""), |feed| async move {
        feed.toggle_archive(id).await.map(Some)
    })
}

/// Deletes a note, keeping it restorable until the next delete.
pub fn notes_delete(id: i64) -> NoteActionResponse {
    note_action("notes_delete", ("Note deleted.", ""), |feed| async move {
        feed.delete_note(id).await.map(Some)
    })
}

/// Restores the last deleted note. `ok` with `note: None` means nothing
/// was waiting in the undo slot.
pub fn notes_undo_delete() -> NoteActionResponse {
    note_action("notes_undo_delete", ("Note restored.", "Nothing to undo."), |feed| {
        feed.undo_delete()
    })
}

pub fn notes_clear_undo() -> NoteActionResponse {
    note_action("notes_clear_undo", ("", "Undo cleared."), |feed| async move {
        feed.clear_undo().await.map(|()| None::<Note>)
    })
}

/// Default list from the feed cache: non-archived, pinned first, newest first.
pub fn notes_list() -> NotesListResponse {
    list_action("notes_list", |feed| async move {
        Ok::<_, FeedError>(feed.snapshot().to_vec())
    })
}

pub fn notes_list_archived() -> NotesListResponse {
    list_action("notes_list_archived", |feed| async move {
        Ok::<_, FeedError>(feed.archived_snapshot().to_vec())
    })
}

pub fn notes_search(query: String) -> NotesListResponse {
    list_action("notes_search", |feed| feed.search(query))
}

/// Revision of the cached lists; bumped after every published mutation.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_revision() -> u64 {
    resolve_store().map_or(0, |store| *store.feed.revision().borrow())
}

/// Blocks until the cached lists move past `after` or `timeout_ms` passes,
/// then returns the current revision.
///
/// Dart loops on this to refresh its list views.
pub fn notes_wait_revision(after: u64, timeout_ms: u32) -> u64 {
    let Ok(store) = resolve_store() else {
        return after;
    };
    let mut revision = store.feed.revision();
    store.runtime.block_on(async {
        let changed = revision.wait_for(|current| *current > after);
        let _ = tokio::time::timeout(Duration::from_millis(u64::from(timeout_ms)), changed).await;
    });
    let current = *revision.borrow();
    current
}

/// Local email/password checks to run before the app calls its provider.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_validate_credentials(email: String, password: String) -> AuthResponse {
    validate_credentials(&email, &password)
        .unwrap_or_else(AuthOutcome::success)
        .into()
}

/// Records the provider result of a sign-in or sign-up run by the app.
///
/// On success the identity becomes the single cached user. Sign-up
/// failures for an address already registered are reworded.
pub fn auth_complete(result: HostAuthResult) -> AuthResponse {
    let provider_result = match result.uid.filter(|uid| !uid.trim().is_empty()) {
        Some(uid) => Ok(ProviderUser {
            uid,
            email: result.provider_email,
            display_name: result.display_name,
        }),
        None => Err(ProviderError {
            message: result.error_message,
        }),
    };
    match resolve_store().and_then(|store| {
        store
            .auth
            .complete_sign_in(result.flow.into(), provider_result, &result.email)
            .map_err(|err| err.to_string())
    }) {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            warn!("event=auth_complete module=ffi status=error");
            AuthResponse {
                success: false,
                message: format!("auth_complete failed: {err}"),
            }
        }
    }
}

/// Reloads the cached user written by a previous session.
pub fn auth_restore_session() -> Option<UserItem> {
    let store = resolve_store().ok()?;
    match store.auth.restore_session() {
        Ok(user) => user.map(UserItem::from),
        Err(err) => {
            warn!("event=auth_restore_session module=ffi status=error error={err}");
            None
        }
    }
}

pub fn user_cache_current() -> Option<UserItem> {
    resolve_store()
        .ok()?
        .auth
        .current_user()
        .map(UserItem::from)
}

/// Signs out locally: clears the cached user.
pub fn user_cache_clear() -> String {
    match resolve_store().and_then(|store| store.auth.sign_out().map_err(|err| err.to_string())) {
        Ok(()) => String::new(),
        Err(err) => format!("user_cache_clear failed: {err}"),
    }
}

/// Editor palette as ARGB values, default color first.
#[flutter_rust_bridge::frb(sync)]
pub fn note_palette() -> Vec<u32> {
    NoteColor::PALETTE.iter().map(|color| color.argb()).collect()
}

/// `messages` is `(message when a note comes back, message when none does)`.
fn note_action<Fut>(
    name: &str,
    messages: (&str, &str),
    op: impl FnOnce(&'static NoteFeed<SharedConnection>) -> Fut,
) -> NoteActionResponse
where
    Fut: Future<Output = Result<Option<Note>, FeedError>>,
{
    let store = match resolve_store() {
        Ok(store) => store,
        Err(err) => return failed_action(name, err, false),
    };
    let outcome = store.runtime.block_on(op(&store.feed));
    // The undo slot survives failed calls, so the flag is read either way.
    let undo_available = store.feed.undo_pending();
    match outcome {
        Ok(note) => NoteActionResponse {
            ok: true,
            message: if note.is_some() {
                messages.0.to_string()
            } else {
                messages.1.to_string()
            },
            note: note.map(NoteItem::from),
            undo_available,
        },
        Err(err) => failed_action(name, err.to_string(), undo_available),
    }
}

fn failed_action(name: &str, err: String, undo_available: bool) -> NoteActionResponse {
    warn!("event={name} module=ffi status=error undo_available={undo_available}");
    NoteActionResponse {
        ok: false,
        note: None,
        message: format!("{name} failed: {err}"),
        undo_available,
    }
}

fn list_action<Fut>(
    name: &str,
    op: impl FnOnce(&'static NoteFeed<SharedConnection>) -> Fut,
) -> NotesListResponse
where
    Fut: Future<Output = Result<Vec<Note>, FeedError>>,
{
    let result = resolve_store().and_then(|store| {
        store
            .runtime
            .block_on(op(&store.feed))
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(notes) => {
            let items: Vec<NoteItem> = notes.into_iter().map(NoteItem::from).collect();
            let message = if items.is_empty() {
                "No notes.".to_string()
            } else {
                format!("Found {} note(s).", items.len())
            };
            NotesListResponse { items, message }
        }
        Err(err) => {
            warn!("event={name} module=ffi status=error");
            NotesListResponse {
                items: Vec::new(),
                message: format!("{name} failed: {err}"),
            }
        }
    }
}

fn resolve_store() -> Result<&'static Store, String> {
    store_at(default_db_path())
}

fn store_at(db_path: PathBuf) -> Result<&'static Store, String> {
    if let Some(store) = STORE.get() {
        return Ok(store);
    }
    let conn = open_db(&db_path).map_err(|err| format!("database open failed: {err}"))?;
    let conn = SharedConnection::new(conn);
    let runtime = Builder::new_multi_thread()
        .worker_threads(WORKER_THREADS)
        .thread_name("jotter-ffi")
        .enable_time()
        .build()
        .map_err(|err| format!("note runtime failed to start: {err}"))?;
    let feed = NoteFeed::new(NoteService::new(conn.clone()))
        .map_err(|err| format!("note feed failed to load: {err}"))?;
    let auth = AuthManager::new(HostIdentityProvider, conn)
        .map_err(|err| format!("user cache failed to load: {err}"))?;
    let store = Store {
        db_path,
        runtime,
        feed,
        auth,
    };
    // A racing initializer may win; its store is the one every caller uses.
    let _ = STORE.set(store);
    STORE
        .get()
        .ok_or_else(|| "note store unavailable".to_string())
}

fn default_db_path() -> PathBuf {
    if let Ok(raw) = std::env::var(DB_PATH_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(DB_FILE_NAME)
}
