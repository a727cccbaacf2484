mod common;

use common::{shared_in_memory, ManualClock};
use jotter_core::{
    NewNote, NewNoteRow, Note, NoteFeed, NoteId, NoteRepository, NoteService, RepoError,
    RepoResult, SharedConnection,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

type TestFeed = NoteFeed<SharedConnection, Arc<ManualClock>>;

fn feed_at(now_ms: i64) -> (TestFeed, Arc<ManualClock>) {
    let clock = ManualClock::at(now_ms);
    let service = NoteService::with_clock(shared_in_memory(), Arc::clone(&clock));
    (NoteFeed::new(service).unwrap(), clock)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn observers_see_new_list_after_each_mutation() {
    let (feed, clock) = feed_at(1_000);
    let mut notes = feed.notes();
    assert!(notes.borrow_and_update().is_empty());

    let first = feed.create_note(NewNote::new("first", "")).await.unwrap();
    assert!(notes.has_changed().unwrap());
    assert_eq!(notes.borrow_and_update()[0].id, first.id);

    clock.advance(10);
    let second = feed.create_note(NewNote::new("second", "")).await.unwrap();
    let ids: Vec<_> = notes.borrow_and_update().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    clock.advance(10);
    feed.toggle_pin(first.id).await.unwrap();
    let ids: Vec<_> = feed.snapshot().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delete_and_undo_drive_undo_availability() {
    let (feed, _clock) = feed_at(1_000);
    let undo = feed.undo_available();
    let note = feed.create_note(NewNote::new("temp", "")).await.unwrap();

    feed.delete_note(note.id).await.unwrap();
    assert!(*undo.borrow());
    assert!(feed.snapshot().is_empty());

    let restored = feed.undo_delete().await.unwrap();
    assert_eq!(restored, Some(note.clone()));
    assert!(!*undo.borrow());
    assert_eq!(feed.snapshot().as_slice(), &[note]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn clear_undo_publishes_unavailable() {
    let (feed, _clock) = feed_at(1_000);
    let undo = feed.undo_available();
    let note = feed.create_note(NewNote::new("temp", "")).await.unwrap();

    feed.delete_note(note.id).await.unwrap();
    feed.clear_undo().await.unwrap();
    assert!(!*undo.borrow());
    assert_eq!(feed.undo_delete().await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn archive_moves_note_between_observed_lists() {
    let (feed, clock) = feed_at(1_000);
    let active = feed.notes();
    let archived = feed.archived_notes();
    let note = feed.create_note(NewNote::new("trip", "")).await.unwrap();

    clock.advance(5);
    feed.toggle_archive(note.id).await.unwrap();
    assert!(active.borrow().is_empty());
    assert_eq!(archived.borrow()[0].id, note.id);

    clock.advance(5);
    feed.toggle_archive(note.id).await.unwrap();
    assert_eq!(active.borrow()[0].id, note.id);
    assert!(archived.borrow().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_mutation_does_not_bump_revision() {
    let (feed, _clock) = feed_at(1_000);
    let revision = feed.revision();

    assert!(feed.toggle_pin(404).await.is_err());
    assert!(feed.create_note(NewNote::new("", "")).await.is_err());
    assert_eq!(*revision.borrow(), 0);

    feed.create_note(NewNote::new("ok", "")).await.unwrap();
    assert_eq!(*revision.borrow(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn live_search_follows_edits() {
    let (feed, clock) = feed_at(1_000);
    let note = feed
        .create_note(NewNote::new("Shopping", "milk"))
        .await
        .unwrap();
    let mut results = feed.subscribe_search("BREAD").unwrap();
    assert!(results.borrow_and_update().is_empty());

    clock.advance(1);
    let mut edited = note.clone();
    edited.content = "milk and bread".to_string();
    feed.update_note(edited).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), results.changed())
        .await
        .expect("search should refresh")
        .unwrap();
    assert_eq!(results.borrow()[0].id, note.id);

    let one_shot = feed.search("bread").await.unwrap();
    assert_eq!(one_shot.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn live_search_agrees_with_storage_on_leading_space() {
    let (feed, _clock) = feed_at(1_000);
    feed.create_note(NewNote::new("concatenate", ""))
        .await
        .unwrap();

    let live = feed.subscribe_search(" cat").unwrap();
    assert!(live.borrow().is_empty());
    assert!(feed.search(" cat").await.unwrap().is_empty());
    assert_eq!(feed.search("cat").await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_all_land_in_snapshot() {
    let (feed, _clock) = feed_at(1_000);

    let mut handles = Vec::new();
    for idx in 0..8 {
        let feed = feed.clone();
        handles.push(tokio::spawn(async move {
            feed.create_note(NewNote::new(format!("note {idx}"), ""))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(feed.snapshot().len(), 8);
    assert_eq!(*feed.revision().borrow(), 8);
}

/// Storage whose list queries can be switched off while writes keep working.
struct ListOutage {
    inner: SharedConnection,
    lists_down: Arc<AtomicBool>,
}

impl ListOutage {
    fn check_lists(&self) -> RepoResult<()> {
        if self.lists_down.load(Ordering::SeqCst) {
            Err(RepoError::InvalidData("list query unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl NoteRepository for ListOutage {
    fn insert_note(&self, row: &NewNoteRow) -> RepoResult<NoteId> {
        self.inner.insert_note(row)
    }

    fn restore_note(&self, note: &Note) -> RepoResult<()> {
        self.inner.restore_note(note)
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        self.inner.update_note(note)
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        self.inner.delete_note(id)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.inner.get_note(id)
    }

    fn list_active(&self) -> RepoResult<Vec<Note>> {
        self.check_lists()?;
        self.inner.list_active()
    }

    fn list_archived(&self) -> RepoResult<Vec<Note>> {
        self.check_lists()?;
        self.inner.list_archived()
    }

    fn search_notes(&self, query: &str) -> RepoResult<Vec<Note>> {
        self.inner.search_notes(query)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn committed_write_survives_failed_refresh() {
    let lists_down = Arc::new(AtomicBool::new(false));
    let repo = ListOutage {
        inner: shared_in_memory(),
        lists_down: Arc::clone(&lists_down),
    };
    let feed = NoteFeed::new(NoteService::with_clock(repo, ManualClock::at(1_000))).unwrap();

    lists_down.store(true, Ordering::SeqCst);
    let created = feed
        .create_note(NewNote::new("kept", ""))
        .await
        .unwrap();
    assert_eq!(*feed.revision().borrow(), 0);
    assert!(feed.snapshot().is_empty());
    assert_eq!(feed.get_note(created.id).await.unwrap(), Some(created.clone()));

    lists_down.store(false, Ordering::SeqCst);
    feed.toggle_pin(created.id).await.unwrap();
    assert_eq!(*feed.revision().borrow(), 1);
    assert_eq!(feed.snapshot()[0].id, created.id);

    lists_down.store(true, Ordering::SeqCst);
    feed.delete_note(created.id).await.unwrap();
    assert!(feed.undo_pending());
    assert_eq!(*feed.revision().borrow(), 1);
}

#[test]
fn subscribe_search_outside_runtime_is_an_error() {
    let (feed, _clock) = feed_at(1_000);
    assert!(feed.subscribe_search("x").is_err());
}
