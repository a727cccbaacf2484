//! Single-row cache of the signed-in user.
//!
//! # Invariants
//! - The `users` table holds at most one row (`slot = 1`).
//! - `upsert_user` replaces the previous identity wholesale.

use crate::model::user::User;
use crate::repo::RepoResult;
use rusqlite::{params, Connection};

/// Repository interface for the cached user record.
pub trait UserRepository {
    fn upsert_user(&self, user: &User) -> RepoResult<()>;
    fn current_user(&self) -> RepoResult<Option<User>>;
    fn clear_users(&self) -> RepoResult<()>;
}

/// SQLite-backed user cache.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn upsert_user(&self, user: &User) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO users (slot, uid, email, display_name)
             VALUES (1, ?1, ?2, ?3);",
            params![
                user.uid.as_str(),
                user.email.as_str(),
                user.display_name.as_deref()
            ],
        )?;
        Ok(())
    }

    fn current_user(&self) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uid, email, display_name FROM users WHERE slot = 1;")?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(User {
                uid: row.get("uid")?,
                email: row.get("email")?,
                display_name: row.get("display_name")?,
            }));
        }
        Ok(None)
    }

    fn clear_users(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM users;", [])?;
        Ok(())
    }
}
