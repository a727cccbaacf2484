use jotter_core::db::open_db_in_memory;
use jotter_core::{
    NewNote, Note, NoteColor, NoteRepository, RepoError, SqliteNoteRepository,
    SqliteUserRepository, User, UserRepository,
};

fn insert(repo: &SqliteNoteRepository<'_>, title: &str, content: &str, at: i64) -> Note {
    let row = NewNote::new(title, content).into_row(at);
    let id = repo.insert_note(&row).unwrap();
    row.with_id(id)
}

#[test]
fn insert_and_get_roundtrip_preserves_every_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    let row = NewNote::new("Groceries", "milk, eggs")
        .with_color(NoteColor::LIGHT_YELLOW)
        .into_row(1_000);
    let id = repo.insert_note(&row).unwrap();

    let loaded = repo.get_note(id).unwrap().unwrap();
    assert_eq!(loaded, row.with_id(id));
    assert_eq!(loaded.color, Some(NoteColor::LIGHT_YELLOW));
}

#[test]
fn ids_are_monotonic_and_not_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    let first = insert(&repo, "a", "", 1);
    let second = insert(&repo, "b", "", 2);
    assert!(second.id > first.id);

    repo.delete_note(second.id).unwrap();
    let third = insert(&repo, "c", "", 3);
    assert!(third.id > second.id);
}

#[test]
fn update_and_delete_missing_note_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    let ghost = NewNote::new("ghost", "").into_row(1).with_id(42);
    assert!(matches!(
        repo.update_note(&ghost).unwrap_err(),
        RepoError::NotFound(42)
    ));
    assert!(matches!(
        repo.delete_note(42).unwrap_err(),
        RepoError::NotFound(42)
    ));
}

#[test]
fn restore_reinserts_under_original_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    let note = insert(&repo, "keep me", "body", 10);
    insert(&repo, "newer", "", 20);
    repo.delete_note(note.id).unwrap();
    assert!(repo.get_note(note.id).unwrap().is_none());

    repo.restore_note(&note).unwrap();
    assert_eq!(repo.get_note(note.id).unwrap(), Some(note));
}

#[test]
fn active_list_orders_pinned_first_then_newest() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    let mut a = insert(&repo, "a", "", 100);
    let b = insert(&repo, "b", "", 300);
    let mut c = insert(&repo, "c", "", 200);
    let d = insert(&repo, "d", "", 400);
    a.is_pinned = true;
    c.is_pinned = true;
    repo.update_note(&a).unwrap();
    repo.update_note(&c).unwrap();

    let ids: Vec<_> = repo.list_active().unwrap().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![c.id, a.id, d.id, b.id]);
}

#[test]
fn archived_notes_are_split_from_active_list() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    let mut archived = insert(&repo, "old", "", 100);
    let active = insert(&repo, "current", "", 200);
    archived.is_archived = true;
    archived.is_pinned = true;
    repo.update_note(&archived).unwrap();

    let active_ids: Vec<_> = repo.list_active().unwrap().iter().map(|n| n.id).collect();
    let archived_ids: Vec<_> = repo.list_archived().unwrap().iter().map(|n| n.id).collect();
    assert_eq!(active_ids, vec![active.id]);
    assert_eq!(archived_ids, vec![archived.id]);
}

#[test]
fn search_matches_title_or_content_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    let by_title = insert(&repo, "Weekly PLAN", "", 1);
    let by_content = insert(&repo, "misc", "plan the trip", 2);
    insert(&repo, "unrelated", "nothing here", 3);

    let ids: Vec<_> = repo
        .search_notes("plan")
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(ids, vec![by_content.id, by_title.id]);
}

#[test]
fn search_treats_wildcards_literally_and_ignores_blank_queries() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    let discount = insert(&repo, "50% off", "", 1);
    insert(&repo, "500 items", "", 2);
    insert(&repo, "snake_case", "", 3);
    insert(&repo, "snakeXcase", "", 4);

    let percent: Vec<_> = repo.search_notes("0%").unwrap();
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0].id, discount.id);
    assert_eq!(repo.search_notes("e_c").unwrap().len(), 1);
    assert!(repo.search_notes("   ").unwrap().is_empty());
}

#[test]
fn search_matches_query_whitespace_exactly() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    insert(&repo, "concatenate", "", 1);
    let tabby = insert(&repo, "a cat nap", "", 2);

    let hits = repo.search_notes(" cat").unwrap();
    assert_eq!(hits, vec![tabby]);
    assert_eq!(repo.search_notes("cat").unwrap().len(), 2);
}

#[test]
fn search_includes_archived_notes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::new(&conn);

    let mut note = insert(&repo, "tax receipts", "", 1);
    note.is_archived = true;
    repo.update_note(&note).unwrap();

    assert_eq!(repo.search_notes("receipts").unwrap(), vec![note]);
}

#[test]
fn corrupted_flag_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    conn.execute(
        "INSERT INTO notes (title, content, created_at, modified_at, is_pinned)
         VALUES ('bad', '', 1, 1, 7);",
        [],
    )
    .unwrap();

    let repo = SqliteNoteRepository::new(&conn);
    assert!(matches!(
        repo.list_active().unwrap_err(),
        RepoError::InvalidData(_)
    ));
}

#[test]
fn user_cache_keeps_only_latest_identity() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);
    assert!(users.current_user().unwrap().is_none());

    let first = User {
        uid: "uid-1".to_string(),
        email: "one@example.com".to_string(),
        display_name: Some("One".to_string()),
    };
    let second = User {
        uid: "uid-2".to_string(),
        email: "two@example.com".to_string(),
        display_name: None,
    };
    users.upsert_user(&first).unwrap();
    users.upsert_user(&second).unwrap();

    assert_eq!(users.current_user().unwrap(), Some(second));
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);

    users.clear_users().unwrap();
    assert!(users.current_user().unwrap().is_none());
}
