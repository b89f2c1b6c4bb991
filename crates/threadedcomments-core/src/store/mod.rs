//! SQLite-backed comment store.
//!
//! Owns the connection and schema, and exposes the bookkeeping writes the
//! tree manager issues as plain column updates. Those updates never go
//! through the create/delete lifecycle, so stamping a parent cannot recurse
//! into another round of bookkeeping.

#![allow(clippy::missing_errors_doc)]

mod query;

pub use query::{Comment, NewComment};
pub(crate) use query::{
    children, comment_by_id, comments_by_ids, list_all, list_for_object, most_recent_child,
    path_range,
};

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// Database of threaded comments.
pub struct CommentStore {
    conn: Connection,
}

impl CommentStore {
    /// Open or create a comment database at the given path.
    ///
    /// Creates parent directories if they don't exist.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create parent directories: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::configure(conn)
    }

    /// Create an in-memory comment database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self> {
        // Subtree removal and last_child nulling are delegated to the
        // foreign-key actions declared in the schema.
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        Ok(Self { conn })
    }

    /// How long a writer waits for a competing write lock before failing.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn
            .busy_timeout(timeout)
            .context("Failed to set busy timeout")
    }

    /// Initialize the database schema.
    ///
    /// Creates the table and indexes if they don't exist.
    pub fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA_SQL)
            .context("Failed to initialize schema")?;
        Ok(())
    }

    /// Begin a write transaction holding the database write lock.
    ///
    /// `IMMEDIATE` takes the lock before the parent row is read, so two
    /// writers under the same parent run one after the other instead of
    /// both bookkeeping from the same stale parent state.
    pub fn begin_write(&self) -> rusqlite::Result<Transaction<'_>> {
        Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
    }

    /// Largest id currently stored, or 0 for an empty store.
    pub fn max_id(&self) -> rusqlite::Result<i64> {
        self.conn.query_row(
            "SELECT COALESCE(MAX(id), 0) FROM threadedcomments_comment",
            [],
            |row| row.get(0),
        )
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Render a timestamp in the fixed-width form stored in the database.
///
/// Microsecond precision with a `Z` suffix keeps every value the same
/// length, so `ORDER BY submit_date` is chronological.
#[must_use]
pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ============================================================================
// Row Writes
// ============================================================================

/// Insert the base record and return its store-assigned id.
///
/// `tree_path` starts empty and `newest_activity` unset; both belong to the
/// tree manager.
pub(crate) fn insert_comment(
    conn: &Connection,
    new: &NewComment,
    submit_date: &DateTime<Utc>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO threadedcomments_comment (
            parent_id, content_object, user_name, user_email, user_url,
            comment, ip_address, is_public, is_removed, submit_date
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)",
        params![
            new.parent_id,
            new.content_object,
            new.user_name,
            new.user_email,
            new.user_url,
            new.comment,
            new.ip_address,
            new.is_public,
            format_ts(submit_date),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Remove a row. Descendants go with it through `ON DELETE CASCADE`.
pub(crate) fn delete_row(conn: &Connection, id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM threadedcomments_comment WHERE id = ?",
        params![id],
    )
}

// ============================================================================
// Bookkeeping Writes
// ============================================================================

pub(crate) fn set_tree_path(conn: &Connection, id: i64, tree_path: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE threadedcomments_comment SET tree_path = ? WHERE id = ?",
        params![tree_path, id],
    )?;
    Ok(())
}

pub(crate) fn set_last_child(
    conn: &Connection,
    id: i64,
    last_child_id: Option<i64>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE threadedcomments_comment SET last_child_id = ? WHERE id = ?",
        params![last_child_id, id],
    )?;
    Ok(())
}

pub(crate) fn set_newest_activity(
    conn: &Connection,
    id: i64,
    ts: &DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE threadedcomments_comment SET newest_activity = ? WHERE id = ?",
        params![format_ts(ts), id],
    )?;
    Ok(())
}

/// Stamp `newest_activity` on every direct child of `parent_id`.
pub(crate) fn stamp_children_activity(
    conn: &Connection,
    parent_id: i64,
    ts: &DateTime<Utc>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE threadedcomments_comment SET newest_activity = ? WHERE parent_id = ?",
        params![format_ts(ts), parent_id],
    )
}

/// Overwrite all three bookkeeping columns at once (used by rebuilds).
pub(crate) fn set_bookkeeping(
    conn: &Connection,
    id: i64,
    tree_path: &str,
    last_child_id: Option<i64>,
    newest_activity: &DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE threadedcomments_comment
         SET tree_path = ?, last_child_id = ?, newest_activity = ?
         WHERE id = ?",
        params![tree_path, last_child_id, format_ts(newest_activity), id],
    )?;
    Ok(())
}

// ============================================================================
// Schema SQL
// ============================================================================

const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS threadedcomments_comment (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER
        REFERENCES threadedcomments_comment(id) ON DELETE CASCADE,
    last_child_id INTEGER
        REFERENCES threadedcomments_comment(id) ON DELETE SET NULL,
    tree_path TEXT NOT NULL DEFAULT '',
    submit_date TEXT NOT NULL,
    newest_activity TEXT,
    content_object TEXT NOT NULL,
    user_name TEXT NOT NULL,
    user_email TEXT,
    user_url TEXT,
    comment TEXT NOT NULL,
    ip_address TEXT,
    is_public INTEGER NOT NULL DEFAULT 1,
    is_removed INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_comment_tree_path ON threadedcomments_comment(tree_path);
CREATE INDEX IF NOT EXISTS idx_comment_parent_submit ON threadedcomments_comment(parent_id, submit_date);
CREATE INDEX IF NOT EXISTS idx_comment_last_child ON threadedcomments_comment(last_child_id);
CREATE INDEX IF NOT EXISTS idx_comment_content_object ON threadedcomments_comment(content_object);
";

// ============================================================================
// Tests
// ============================================================================
