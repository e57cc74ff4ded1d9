//! SQLite-backed sequence allocator.
//!
//! # Responsibility
//! - Persist per-path counters so numbering survives process restarts.
//! - Record every issued number for audit.
//!
//! # Invariants
//! - Each `commit` runs in one `IMMEDIATE` transaction: read, advance,
//!   log, commit. Concurrent writers (threads or processes) serialize on the
//!   database write lock.
//! - `sequence_issue_log` holds at most one row per `(path, value)`.
//! - `next_value` stays in `1..=EXHAUSTED_NEXT`.

use crate::db::migrations::latest_version;
use crate::db::{open_target, DbTarget};
use crate::sequence::{
    issuable, SequenceAllocator, SequenceCounter, SequenceError, SequencePath, SequenceResult,
    EXHAUSTED_NEXT, FIRST_SEQUENTIAL,
};
use log::debug;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;

/// Durable allocator over one SQLite connection.
pub struct SqliteSequenceAllocator {
    conn: Mutex<Connection>,
}

impl SqliteSequenceAllocator {
    /// Wraps an already migrated connection.
    pub fn try_new(conn: Connection) -> SequenceResult<Self> {
        ensure_sequence_connection_ready(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> SequenceResult<Self> {
        Self::open_target(&DbTarget::File(path.as_ref().to_path_buf()))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> SequenceResult<Self> {
        Self::open_target(&DbTarget::Memory)
    }

    pub fn open_target(target: &DbTarget) -> SequenceResult<Self> {
        Self::try_new(open_target(target)?)
    }

    /// Every value issued for `path`, ascending.
    pub fn issued_values(&self, path: &SequencePath) -> SequenceResult<Vec<u32>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT issued_value
             FROM sequence_issue_log
             WHERE layer = ?1 AND category = ?2 AND subcategory = ?3
             ORDER BY issued_value ASC;",
        )?;
        let mut rows = stmt.query(params![path.layer, path.category, path.subcategory])?;
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            values.push(to_sequential(row.get::<_, i64>(0)?, "sequence_issue_log.issued_value")?);
        }
        Ok(values)
    }
}

impl SequenceAllocator for SqliteSequenceAllocator {
    fn peek_next(&self, path: &SequencePath) -> SequenceResult<u32> {
        let conn = self.conn.lock();
        match load_next_value(&conn, path)? {
            Some(next) => issuable(path, next),
            None => Ok(FIRST_SEQUENTIAL),
        }
    }

    fn commit(&self, path: &SequencePath) -> SequenceResult<u32> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let stored = load_next_value(&tx, path)?.unwrap_or(u64::from(FIRST_SEQUENTIAL));
        let issued = issuable(path, stored)?;
        let next = i64::from(issued) + 1;

        tx.execute(
            "INSERT INTO sequence_counters (layer, category, subcategory, next_value)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (layer, category, subcategory) DO UPDATE
             SET next_value = excluded.next_value,
                 updated_at = (strftime('%s', 'now') * 1000);",
            params![path.layer, path.category, path.subcategory, next],
        )?;
        tx.execute(
            "INSERT INTO sequence_issue_log (layer, category, subcategory, issued_value)
             VALUES (?1, ?2, ?3, ?4);",
            params![path.layer, path.category, path.subcategory, i64::from(issued)],
        )?;
        tx.commit()?;

        debug!(
            "event=sequence_commit module=sequence status=ok store=sqlite path={} issued={}",
            path, issued
        );
        Ok(issued)
    }

    fn counters(&self) -> SequenceResult<Vec<SequenceCounter>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT layer, category, subcategory, next_value
             FROM sequence_counters
             ORDER BY layer ASC, category ASC, subcategory ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counters = Vec::new();
        while let Some(row) = rows.next()? {
            counters.push(SequenceCounter {
                path: SequencePath {
                    layer: row.get(0)?,
                    category: row.get(1)?,
                    subcategory: row.get(2)?,
                },
                next: to_next_value(row.get::<_, i64>(3)?, "sequence_counters.next_value")?,
            });
        }
        Ok(counters)
    }
}

fn load_next_value(conn: &Connection, path: &SequencePath) -> SequenceResult<Option<u64>> {
    let stored = conn
        .query_row(
            "SELECT next_value
             FROM sequence_counters
             WHERE layer = ?1 AND category = ?2 AND subcategory = ?3;",
            params![path.layer, path.category, path.subcategory],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    stored
        .map(|value| to_next_value(value, "sequence_counters.next_value"))
        .transpose()
}

fn to_sequential(value: i64, column: &str) -> SequenceResult<u32> {
    u32::try_from(value)
        .ok()
        .filter(|value| *value >= FIRST_SEQUENTIAL)
        .ok_or_else(|| SequenceError::InvalidData(format!("value `{value}` in {column}")))
}

fn to_next_value(value: i64, column: &str) -> SequenceResult<u64> {
    u64::try_from(value)
        .ok()
        .filter(|value| (u64::from(FIRST_SEQUENTIAL)..=EXHAUSTED_NEXT).contains(value))
        .ok_or_else(|| SequenceError::InvalidData(format!("value `{value}` in {column}")))
}

fn ensure_sequence_connection_ready(conn: &Connection) -> SequenceResult<()> {
    let actual_version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(SequenceError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
