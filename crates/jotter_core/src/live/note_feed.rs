//! Note feed: a note manager wrapped with `watch` channels.
//!
//! Every mutation runs on the blocking pool, then reloads the default and
//! archived lists and publishes them while the service lock is still held.
//! Holding the lock while publishing is what keeps snapshot order equal to
//! mutation order.

use crate::clock::{Clock, SystemClock};
use crate::model::note::{default_list_order, NewNote, Note, NoteId};
use crate::repo::note_repo::NoteRepository;
use crate::repo::RepoError;
use crate::service::note_service::{NoteService, NoteServiceError};
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::{self, JoinError};

/// Immutable list snapshot shared with every observer.
pub type NoteSnapshot = Arc<Vec<Note>>;

/// Feed-level failure.
#[derive(Debug)]
pub enum FeedError {
    Service(NoteServiceError),
    /// The blocking worker panicked or was cancelled.
    Join(JoinError),
    LockPoisoned,
    /// A background subscription was requested outside a Tokio runtime.
    NoRuntime,
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(err) => write!(f, "{err}"),
            Self::Join(err) => write!(f, "note worker failed: {err}"),
            Self::LockPoisoned => write!(f, "note feed lock poisoned"),
            Self::NoRuntime => write!(f, "no tokio runtime available for note feed"),
        }
    }
}

impl Error for FeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Service(err) => Some(err),
            Self::Join(err) => Some(err),
            Self::LockPoisoned | Self::NoRuntime => None,
        }
    }
}

impl From<NoteServiceError> for FeedError {
    fn from(value: NoteServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<RepoError> for FeedError {
    fn from(value: RepoError) -> Self {
        Self::Service(value.into())
    }
}

struct FeedState<R: NoteRepository, C: Clock> {
    service: NoteService<R, C>,
    revision: u64,
}

struct Channels {
    active: watch::Sender<NoteSnapshot>,
    archived: watch::Sender<NoteSnapshot>,
    undo_available: watch::Sender<bool>,
    revision: watch::Sender<u64>,
}

struct FeedInner<R: NoteRepository, C: Clock> {
    state: Mutex<FeedState<R, C>>,
    channels: Channels,
}

impl<R: NoteRepository, C: Clock> FeedInner<R, C> {
    /// Reloads both lists and publishes them as `revision`.
    ///
    /// Nothing is sent unless both lists loaded.
    fn publish(&self, state: &FeedState<R, C>, revision: u64) -> Result<(), FeedError> {
        let active = state.service.list_notes()?;
        let archived = state.service.list_archived()?;
        self.channels.active.send_replace(Arc::new(active));
        self.channels.archived.send_replace(Arc::new(archived));
        self.channels.revision.send_replace(revision);
        debug!("event=feed_publish module=live status=ok revision={revision}");
        Ok(())
    }
}

/// Observable note manager.
///
/// Cloning yields another handle to the same cache.
pub struct NoteFeed<R: NoteRepository, C: Clock = SystemClock> {
    inner: Arc<FeedInner<R, C>>,
}

impl<R: NoteRepository, C: Clock> Clone for NoteFeed<R, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, C> NoteFeed<R, C>
where
    R: NoteRepository + Send + 'static,
    C: Clock + 'static,
{
    /// Wraps `service` and loads the initial snapshots synchronously.
    pub fn new(service: NoteService<R, C>) -> Result<Self, FeedError> {
        let active = service.list_notes()?;
        let archived = service.list_archived()?;
        let undo = service.undo_available();
        let (active, _) = watch::channel(Arc::new(active));
        let (archived, _) = watch::channel(Arc::new(archived));
        let (undo_available, _) = watch::channel(undo);
        let (revision, _) = watch::channel(0);

        Ok(Self {
            inner: Arc::new(FeedInner {
                state: Mutex::new(FeedState {
                    service,
                    revision: 0,
                }),
                channels: Channels {
                    active,
                    archived,
                    undo_available,
                    revision,
                },
            }),
        })
    }

    /// Default list observer: non-archived, pinned first, newest first.
    pub fn notes(&self) -> watch::Receiver<NoteSnapshot> {
        self.inner.channels.active.subscribe()
    }

    pub fn archived_notes(&self) -> watch::Receiver<NoteSnapshot> {
        self.inner.channels.archived.subscribe()
    }

    pub fn undo_available(&self) -> watch::Receiver<bool> {
        self.inner.channels.undo_available.subscribe()
    }

    /// Bumped once per mutation whose snapshots were published.
    pub fn revision(&self) -> watch::Receiver<u64> {
        self.inner.channels.revision.subscribe()
    }

    /// Current default list without subscribing.
    pub fn snapshot(&self) -> NoteSnapshot {
        Arc::clone(&self.inner.channels.active.borrow())
    }

    pub fn archived_snapshot(&self) -> NoteSnapshot {
        Arc::clone(&self.inner.channels.archived.borrow())
    }

    /// Last published undo availability.
    pub fn undo_pending(&self) -> bool {
        *self.inner.channels.undo_available.borrow()
    }

    pub async fn create_note(&self, draft: NewNote) -> Result<Note, FeedError> {
        self.mutate("note_create", move |service| service.create_note(draft))
            .await
    }

    pub async fn update_note(&self, note: Note) -> Result<Note, FeedError> {
        self.mutate("note_update", move |service| service.update_note(note))
            .await
    }

    pub async fn toggle_pin(&self, id: NoteId) -> Result<Note, FeedError> {
        self.mutate("note_toggle_pin", move |service| service.toggle_pin(id))
            .await
    }

    pub async fn toggle_archive(&self, id: NoteId) -> Result<Note, FeedError> {
        self.mutate("note_toggle_archive", move |service| {
            service.toggle_archive(id)
        })
        .await
    }

    /// Deletes a note; it stays restorable until the next delete.
    pub async fn delete_note(&self, id: NoteId) -> Result<Note, FeedError> {
        self.mutate("note_delete", move |service| service.delete_note(id))
            .await
    }

    pub async fn undo_delete(&self) -> Result<Option<Note>, FeedError> {
        self.mutate("note_undo_delete", |service| service.undo_delete())
            .await
    }

    pub async fn clear_undo(&self) -> Result<(), FeedError> {
        self.mutate("note_clear_undo", |service| {
            service.clear_undo();
            Ok(())
        })
        .await
    }

    pub async fn get_note(&self, id: NoteId) -> Result<Option<Note>, FeedError> {
        self.read(move |service| service.get_note(id)).await
    }

    /// One-shot storage search.
    pub async fn search(&self, query: impl Into<String>) -> Result<Vec<Note>, FeedError> {
        let query = query.into();
        self.read(move |service| service.search_notes(&query)).await
    }

    /// Live search over the cached snapshots.
    ///
    /// The returned receiver is refreshed after every mutation until it is
    /// dropped. Matches storage search: archived notes included, ASCII case
    /// folding, default-list order.
    pub fn subscribe_search(
        &self,
        query: impl Into<String>,
    ) -> Result<watch::Receiver<NoteSnapshot>, FeedError> {
        let handle = Handle::try_current().map_err(|_| FeedError::NoRuntime)?;
        let query = query.into();
        let active = self.notes();
        let archived = self.archived_notes();
        let mut revision = self.revision();

        let (tx, rx) = watch::channel(filter_snapshots(&active, &archived, &query));
        handle.spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    changed = revision.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        tx.send_replace(filter_snapshots(&active, &archived, &query));
                    }
                }
            }
        });
        Ok(rx)
    }

    async fn mutate<T, F>(&self, event: &'static str, op: F) -> Result<T, FeedError>
    where
        T: Send + 'static,
        F: FnOnce(&mut NoteService<R, C>) -> Result<T, NoteServiceError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let result = task::spawn_blocking(move || -> Result<T, FeedError> {
            let mut state = inner.state.lock().map_err(|_| FeedError::LockPoisoned)?;
            let value = op(&mut state.service)?;
            inner
                .channels
                .undo_available
                .send_replace(state.service.undo_available());
            // Committed: a failed refresh is logged, not returned.
            let next = state.revision + 1;
            match inner.publish(&state, next) {
                Ok(()) => state.revision = next,
                Err(err) => {
                    error!("event=feed_publish module=live status=error op={event} error={err}")
                }
            }
            Ok(value)
        })
        .await
        .map_err(FeedError::Join)?;

        if let Err(err) = &result {
            error!("event={event} module=live status=error error={err}");
        }
        result
    }

    async fn read<T, F>(&self, op: F) -> Result<T, FeedError>
    where
        T: Send + 'static,
        F: FnOnce(&NoteService<R, C>) -> Result<T, RepoError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        task::spawn_blocking(move || -> Result<T, FeedError> {
            let state = inner.state.lock().map_err(|_| FeedError::LockPoisoned)?;
            Ok(op(&state.service)?)
        })
        .await
        .map_err(FeedError::Join)?
    }
}

fn filter_snapshots(
    active: &watch::Receiver<NoteSnapshot>,
    archived: &watch::Receiver<NoteSnapshot>,
    query: &str,
) -> NoteSnapshot {
    let active = Arc::clone(&active.borrow());
    let archived = Arc::clone(&archived.borrow());
    let mut hits: Vec<Note> = active
        .iter()
        .chain(archived.iter())
        .filter(|note| note.matches_text(query))
        .cloned()
        .collect();
    hits.sort_by(default_list_order);
    Arc::new(hits)
}
