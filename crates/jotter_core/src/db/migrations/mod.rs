//! Schema upgrades for the note store.
//!
//! Each step is a named SQL script tagged with the `user_version` it leaves
//! behind. All pending steps run inside one transaction: either the store
//! reaches [`latest_version`] or it stays on the version it was opened with.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "notes",
        sql: include_str!("0001_notes.sql"),
    },
    Step {
        version: 2,
        name: "users",
        sql: include_str!("0002_users.sql"),
    },
];

/// Versions before and after a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaUpgrade {
    pub from: u32,
    pub to: u32,
}

impl SchemaUpgrade {
    /// True when the store was already current.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Schema version this binary upgrades stores to.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Reads the store's `user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - [`DbError::UnsupportedSchemaVersion`] when the store is newer than
///   this binary.
/// - [`DbError::Migration`] naming the step whose script failed; nothing
///   from the run is kept.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<SchemaUpgrade> {
    run_steps(conn, STEPS)
}

fn run_steps(conn: &mut Connection, steps: &[Step]) -> DbResult<SchemaUpgrade> {
    let from = schema_version(conn)?;
    let target = steps.last().map_or(0, |step| step.version);
    if from > target {
        return Err(DbError::UnsupportedSchemaVersion {
            found: from,
            supported: target,
        });
    }
    if from == target {
        return Ok(SchemaUpgrade { from, to: from });
    }

    info!("event=db_migrate module=db status=start from={from} to={target}");
    let tx = conn.transaction()?;
    for step in steps.iter().filter(|step| step.version > from) {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| DbError::Migration {
                version: step.version,
                name: step.name,
                source,
            })?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;
    info!("event=db_migrate module=db status=ok from={from} to={target}");

    Ok(SchemaUpgrade { from, to: target })
}
