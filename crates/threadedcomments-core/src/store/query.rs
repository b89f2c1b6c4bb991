//! Query API for the comment store.
//!
//! Every listing is ordered by `tree_path`, which yields a pre-order walk:
//! a comment comes before its replies, and siblings come in id order.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::config::TreeConfig;
use crate::core::CoreResult;
use crate::path;

// ============================================================================
// Types
// ============================================================================

/// A stored comment with its tree bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub last_child_id: Option<i64>,
    /// Empty until the tree manager assigns it.
    pub tree_path: String,
    pub submit_date: DateTime<Utc>,
    pub newest_activity: Option<DateTime<Utc>>,
    /// Key of the object this comment is attached to (e.g. `post:42`).
    pub content_object: String,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_url: Option<String>,
    pub comment: String,
    pub ip_address: Option<String>,
    pub is_public: bool,
    pub is_removed: bool,
}

impl Comment {
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Number of path segments; 1 for a root, 0 if no path was assigned.
    #[must_use]
    pub fn depth(&self, config: &TreeConfig) -> usize {
        path::depth(&self.tree_path, config)
    }

    /// Id of the root of this comment's thread.
    pub fn root_id(&self, config: &TreeConfig) -> CoreResult<i64> {
        path::root_id(&self.tree_path, config)
    }

    /// Ids of every ancestor, root first.
    pub fn ancestor_ids(&self, config: &TreeConfig) -> CoreResult<Vec<i64>> {
        path::ancestor_ids(&self.tree_path, config)
    }
}

/// Input for a new comment. Bookkeeping columns are not settable here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub parent_id: Option<i64>,
    pub content_object: String,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_url: Option<String>,
    pub comment: String,
    pub ip_address: Option<String>,
    pub is_public: bool,
    /// Defaults to the time of insertion.
    pub submit_date: Option<DateTime<Utc>>,
}

impl NewComment {
    /// A public root comment.
    #[must_use]
    pub fn new(content_object: &str, user_name: &str, comment: &str) -> Self {
        Self {
            parent_id: None,
            content_object: content_object.to_string(),
            user_name: user_name.to_string(),
            user_email: None,
            user_url: None,
            comment: comment.to_string(),
            ip_address: None,
            is_public: true,
            submit_date: None,
        }
    }

    #[must_use]
    pub const fn reply_to(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    #[must_use]
    pub const fn submitted_at(mut self, ts: DateTime<Utc>) -> Self {
        self.submit_date = Some(ts);
        self
    }
}

// ============================================================================
// Row Mapping
// ============================================================================

const COMMENT_COLUMNS: &str = "id, parent_id, last_child_id, tree_path, submit_date,
     newest_activity, content_object, user_name, user_email, user_url,
     comment, ip_address, is_public, is_removed";

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    let submit_date: String = row.get(4)?;
    let newest_activity: Option<String> = row.get(5)?;
    Ok(Comment {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        last_child_id: row.get(2)?,
        tree_path: row.get(3)?,
        submit_date: parse_ts(4, &submit_date)?,
        newest_activity: newest_activity
            .as_deref()
            .map(|raw| parse_ts(5, raw))
            .transpose()?,
        content_object: row.get(6)?,
        user_name: row.get(7)?,
        user_email: row.get(8)?,
        user_url: row.get(9)?,
        comment: row.get(10)?,
        ip_address: row.get(11)?,
        is_public: row.get(12)?,
        is_removed: row.get(13)?,
    })
}

fn collect(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<Comment>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, map_comment)?;
    rows.collect()
}

// ============================================================================
// Query Functions
// ============================================================================

pub(crate) fn comment_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Comment>> {
    conn.query_row(
        &format!("SELECT {COMMENT_COLUMNS} FROM threadedcomments_comment WHERE id = ?"),
        params![id],
        map_comment,
    )
    .optional()
}

/// Look up a set of comments by id, in tree order.
pub(crate) fn comments_by_ids(conn: &Connection, ids: &[i64]) -> rusqlite::Result<Vec<Comment>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    collect(
        conn,
        &format!(
            "SELECT {COMMENT_COLUMNS} FROM threadedcomments_comment
             WHERE id IN ({placeholders})
             ORDER BY tree_path, id"
        ),
        params_from_iter(ids.iter()),
    )
}

pub(crate) fn list_all(conn: &Connection) -> rusqlite::Result<Vec<Comment>> {
    collect(
        conn,
        &format!("SELECT {COMMENT_COLUMNS} FROM threadedcomments_comment ORDER BY tree_path, id"),
        [],
    )
}

pub(crate) fn list_for_object(
    conn: &Connection,
    content_object: &str,
) -> rusqlite::Result<Vec<Comment>> {
    collect(
        conn,
        &format!(
            "SELECT {COMMENT_COLUMNS} FROM threadedcomments_comment
             WHERE content_object = ?
             ORDER BY tree_path, id"
        ),
        params![content_object],
    )
}

/// Direct children of `parent_id`, in tree order.
pub(crate) fn children(conn: &Connection, parent_id: i64) -> rusqlite::Result<Vec<Comment>> {
    collect(
        conn,
        &format!(
            "SELECT {COMMENT_COLUMNS} FROM threadedcomments_comment
             WHERE parent_id = ?
             ORDER BY tree_path, id"
        ),
        params![parent_id],
    )
}

/// Comments whose `tree_path` falls in `[lower, upper)`, in tree order.
pub(crate) fn path_range(
    conn: &Connection,
    lower: &str,
    upper: &str,
) -> rusqlite::Result<Vec<Comment>> {
    collect(
        conn,
        &format!(
            "SELECT {COMMENT_COLUMNS} FROM threadedcomments_comment
             WHERE tree_path >= ? AND tree_path < ?
             ORDER BY tree_path"
        ),
        params![lower, upper],
    )
}

/// The most recently submitted child of `parent_id`, skipping `excluding`.
///
/// Ties on `submit_date` go to the higher id.
pub(crate) fn most_recent_child(
    conn: &Connection,
    parent_id: i64,
    excluding: Option<i64>,
) -> rusqlite::Result<Option<Comment>> {
    conn.query_row(
        &format!(
            "SELECT {COMMENT_COLUMNS} FROM threadedcomments_comment
             WHERE parent_id = ?1 AND (?2 IS NULL OR id <> ?2)
             ORDER BY submit_date DESC, id DESC
             LIMIT 1"
        ),
        params![parent_id, excluding],
        map_comment,
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{insert_comment, set_tree_path, CommentStore};
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn store() -> CommentStore {
        let store = CommentStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store
    }

    #[test]
    fn test_most_recent_child_orders_by_submit_date() {
        let store = store();
        let conn = store.conn();
        let root = insert_comment(conn, &NewComment::new("p", "a", "root"), &ts(0)).unwrap();
        // Inserted out of chronological order on purpose
        let late = insert_comment(conn, &NewComment::new("p", "b", "late").reply_to(root), &ts(20))
            .unwrap();
        let early =
            insert_comment(conn, &NewComment::new("p", "c", "early").reply_to(root), &ts(10))
                .unwrap();

        let top = most_recent_child(conn, root, None).unwrap().unwrap();
        assert_eq!(top.id, late);

        let next = most_recent_child(conn, root, Some(late)).unwrap().unwrap();
        assert_eq!(next.id, early);

        assert!(most_recent_child(conn, early, None).unwrap().is_none());
    }

    #[test]
    fn test_most_recent_child_tie_goes_to_higher_id() {
        let store = store();
        let conn = store.conn();
        let root = insert_comment(conn, &NewComment::new("p", "a", "root"), &ts(0)).unwrap();
        insert_comment(conn, &NewComment::new("p", "b", "x").reply_to(root), &ts(5)).unwrap();
        let second =
            insert_comment(conn, &NewComment::new("p", "b", "y").reply_to(root), &ts(5)).unwrap();

        let top = most_recent_child(conn, root, None).unwrap().unwrap();
        assert_eq!(top.id, second);
    }

    #[test]
    fn test_comments_by_ids_in_tree_order() {
        let store = store();
        let conn = store.conn();
        for (i, p) in ["0000000003", "0000000001", "0000000001/0000000002"]
            .iter()
            .enumerate()
        {
            let id = insert_comment(conn, &NewComment::new("p", "a", "x"), &ts(i as i64)).unwrap();
            set_tree_path(conn, id, p).unwrap();
        }

        let rows = comments_by_ids(conn, &[1, 2, 3]).unwrap();
        let paths: Vec<&str> = rows.iter().map(|c| c.tree_path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["0000000001", "0000000001/0000000002", "0000000003"]
        );
        assert!(comments_by_ids(conn, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_list_for_object_filters() {
        let store = store();
        let conn = store.conn();
        insert_comment(conn, &NewComment::new("post:1", "a", "x"), &ts(0)).unwrap();
        insert_comment(conn, &NewComment::new("post:2", "a", "y"), &ts(1)).unwrap();

        let rows = list_for_object(conn, "post:2").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].comment, "y");
        assert_eq!(list_all(conn).unwrap().len(), 2);
    }

    #[test]
    fn test_comment_serializes() {
        let store = store();
        let conn = store.conn();
        let id = insert_comment(conn, &NewComment::new("post:1", "alice", "hi"), &ts(0)).unwrap();
        let comment = comment_by_id(conn, id).unwrap().unwrap();

        let value = serde_json::to_value(&comment).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["user_name"], "alice");
        assert!(value["parent_id"].is_null());
    }
}
