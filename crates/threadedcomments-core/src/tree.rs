//! Tree manager: materialized paths and parent bookkeeping.
//!
//! Creating a comment inserts the base row, then assigns its `tree_path` and
//! updates the parent's `last_child_id` and `newest_activity`. Deleting a
//! comment first points the parent at its most recent remaining child, then
//! removes the row. Each of these runs in a single write transaction, so no
//! reader ever sees a row without its path or a parent lagging behind a
//! committed child.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::config::TreeConfig;
use crate::core::{CoreError, CoreResult};
use crate::path;
use crate::store::{self, Comment, CommentStore, NewComment};

/// Per-call options for [`TreeManager::create`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Insert the row only: no `tree_path`, no parent bookkeeping.
    ///
    /// For bulk imports; run [`TreeManager::rebuild_paths`] afterwards.
    pub skip_tree_path: bool,
}

/// Owns every write to `tree_path`, `last_child_id` and `newest_activity`.
#[derive(Debug, Clone)]
pub struct TreeManager {
    config: TreeConfig,
}

impl TreeManager {
    /// Create a manager after validating `config`.
    pub fn new(config: TreeConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Insert a comment and materialize its place in the tree.
    ///
    /// A `parent_id` that references no comment fails with the store's
    /// foreign-key error and leaves nothing behind.
    pub fn create(
        &self,
        store: &CommentStore,
        new: &NewComment,
        options: CreateOptions,
    ) -> CoreResult<Comment> {
        let tx = store.begin_write()?;
        // Stamped under the write lock so concurrent writers get submit
        // dates in the same order as their ids.
        let submit_date = new.submit_date.unwrap_or_else(Utc::now);
        let id = store::insert_comment(&tx, new, &submit_date)?;
        let mut comment = store::comment_by_id(&tx, id)?.ok_or(CoreError::CommentNotFound { id })?;

        if options.skip_tree_path {
            // The row must still be addressable once paths are rebuilt.
            path::segment(id, &self.config)?;
            debug!(id, "skipping tree path assignment");
        } else {
            self.assign_path(&tx, &mut comment)?;
        }
        tx.commit()?;

        info!(
            id = comment.id,
            parent_id = comment.parent_id,
            tree_path = %comment.tree_path,
            "created comment"
        );
        Ok(comment)
    }

    /// Compute and persist `tree_path` for a freshly inserted comment, then
    /// update the parent's bookkeeping.
    ///
    /// Must run exactly once, right after the insert, inside the same
    /// transaction. `comment` is updated to match what was written.
    pub fn assign_path(&self, conn: &Connection, comment: &mut Comment) -> CoreResult<()> {
        let tree_path = match comment.parent_id {
            None => path::root(comment.id, &self.config)?,
            Some(parent_id) => {
                let parent = store::comment_by_id(conn, parent_id)?
                    .ok_or(CoreError::CommentNotFound { id: parent_id })?;
                // A parent imported without a path has nothing to extend
                // until `rebuild_paths` runs.
                if parent.tree_path.is_empty() {
                    return Err(CoreError::MalformedPath {
                        path: parent.tree_path,
                    });
                }
                path::join(&parent.tree_path, comment.id, &self.config)?
            }
        };

        store::set_tree_path(conn, comment.id, &tree_path)?;
        store::set_newest_activity(conn, comment.id, &comment.submit_date)?;
        debug!(id = comment.id, %tree_path, "assigned tree path");

        comment.tree_path = tree_path;
        comment.newest_activity = Some(comment.submit_date);

        if let Some(parent_id) = comment.parent_id {
            store::set_last_child(conn, parent_id, Some(comment.id))?;
            store::set_newest_activity(conn, parent_id, &comment.submit_date)?;
            if self.config.stamp_siblings {
                let stamped =
                    store::stamp_children_activity(conn, parent_id, &comment.submit_date)?;
                debug!(parent_id, stamped, "stamped sibling activity");
            }
            debug!(parent_id, last_child_id = comment.id, "updated parent bookkeeping");
        }
        Ok(())
    }

    /// Delete a comment (and, through the store's cascade, its replies).
    ///
    /// Returns the removed comment as it was before deletion.
    pub fn delete(&self, store: &CommentStore, id: i64) -> CoreResult<Comment> {
        let tx = store.begin_write()?;
        let comment = store::comment_by_id(&tx, id)?.ok_or(CoreError::CommentNotFound { id })?;

        self.repair_on_delete(&tx, &comment)?;
        let removed = store::delete_row(&tx, id)?;
        tx.commit()?;

        info!(id, parent_id = comment.parent_id, removed, "deleted comment");
        Ok(comment)
    }

    /// Point the parent of `comment` away from it before the row goes.
    ///
    /// Must run inside the transaction that removes the row.
    pub fn repair_on_delete(&self, conn: &Connection, comment: &Comment) -> CoreResult<()> {
        let Some(parent_id) = comment.parent_id else {
            debug!(id = comment.id, "root comment, no repair needed");
            return Ok(());
        };

        match store::most_recent_child(conn, parent_id, Some(comment.id))? {
            Some(sibling) => {
                store::set_last_child(conn, parent_id, Some(sibling.id))?;
                store::set_newest_activity(conn, parent_id, &sibling.submit_date)?;
                if self.config.stamp_siblings {
                    store::stamp_children_activity(conn, parent_id, &sibling.submit_date)?;
                }
                debug!(
                    parent_id,
                    last_child_id = sibling.id,
                    "repointed parent at most recent remaining child"
                );
            }
            None => {
                let parent = store::comment_by_id(conn, parent_id)?
                    .ok_or(CoreError::CommentNotFound { id: parent_id })?;
                store::set_last_child(conn, parent_id, None)?;
                store::set_newest_activity(conn, parent_id, &parent.submit_date)?;
                debug!(parent_id, "parent has no remaining children");
            }
        }
        Ok(())
    }

    /// Ancestors of `comment`, root first.
    pub fn root_path(&self, conn: &Connection, comment: &Comment) -> CoreResult<Vec<Comment>> {
        let ids = comment.ancestor_ids(&self.config)?;
        Ok(store::comments_by_ids(conn, &ids)?)
    }

    /// Every strict descendant of `comment`, in tree order.
    pub fn descendants(&self, conn: &Connection, comment: &Comment) -> CoreResult<Vec<Comment>> {
        if comment.tree_path.is_empty() {
            return Err(CoreError::MalformedPath {
                path: comment.tree_path.clone(),
            });
        }
        let (lower, upper) = path::descendant_range(&comment.tree_path, &self.config);
        Ok(store::path_range(conn, &lower, &upper)?)
    }

    /// Recompute `tree_path`, `last_child_id` and `newest_activity` for every
    /// comment from the parent links alone.
    ///
    /// Walks parents before children, so it also repairs rows created with
    /// [`CreateOptions::skip_tree_path`]. Returns the number of rows whose
    /// bookkeeping changed.
    pub fn rebuild_paths(&self, store: &CommentStore) -> CoreResult<usize> {
        let tx = store.begin_write()?;
        let rows = store::list_all(&tx)?;
        let plan = self.plan_bookkeeping(&rows)?;

        let mut changed = 0;
        for row in &rows {
            let Some(expected) = plan.get(&row.id) else {
                continue;
            };
            if expected.matches(row) {
                continue;
            }
            store::set_bookkeeping(
                &tx,
                row.id,
                &expected.tree_path,
                expected.last_child_id,
                &expected.newest_activity,
            )?;
            changed += 1;
        }
        tx.commit()?;

        info!(total = rows.len(), changed, "rebuilt tree paths");
        Ok(changed)
    }

    /// Derive the bookkeeping each row should carry.
    ///
    /// `newest_activity` is the latest `submit_date` among the row and its
    /// children, plus its siblings when sibling stamping is on and the row
    /// has a parent; that is the state a chronological replay of the inserts
    /// leaves behind.
    pub(crate) fn plan_bookkeeping(
        &self,
        rows: &[Comment],
    ) -> CoreResult<HashMap<i64, Bookkeeping>> {
        let by_id: HashMap<i64, &Comment> = rows.iter().map(|c| (c.id, c)).collect();
        let mut kids: HashMap<Option<i64>, Vec<&Comment>> = HashMap::new();
        for row in rows {
            kids.entry(row.parent_id).or_default().push(row);
        }

        let latest = |group: &[&Comment]| -> Option<(DateTime<Utc>, i64)> {
            group.iter().map(|c| (c.submit_date, c.id)).max()
        };

        let mut plan = HashMap::with_capacity(rows.len());
        let mut stack: Vec<(i64, String)> = Vec::new();
        for root in kids.get(&None).map(Vec::as_slice).unwrap_or_default() {
            stack.push((root.id, path::root(root.id, &self.config)?));
        }

        while let Some((id, tree_path)) = stack.pop() {
            let Some(row) = by_id.get(&id) else {
                continue;
            };
            let own_kids = kids.get(&Some(id)).map(Vec::as_slice).unwrap_or_default();
            let newest_child = latest(own_kids);

            let mut newest = row.submit_date;
            if let Some((ts, _)) = newest_child {
                newest = newest.max(ts);
            }
            if self.config.stamp_siblings && row.parent_id.is_some() {
                let siblings = kids.get(&row.parent_id).map(Vec::as_slice).unwrap_or_default();
                if let Some((ts, _)) = latest(siblings) {
                    newest = newest.max(ts);
                }
            }

            for kid in own_kids {
                stack.push((kid.id, path::join(&tree_path, kid.id, &self.config)?));
            }
            plan.insert(
                id,
                Bookkeeping {
                    tree_path,
                    last_child_id: newest_child.map(|(_, child_id)| child_id),
                    newest_activity: newest,
                },
            );
        }
        Ok(plan)
    }
}

/// Bookkeeping columns a row is expected to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Bookkeeping {
    pub tree_path: String,
    pub last_child_id: Option<i64>,
    pub newest_activity: DateTime<Utc>,
}

impl Bookkeeping {
    fn matches(&self, row: &Comment) -> bool {
        row.tree_path == self.tree_path
            && row.last_child_id == self.last_child_id
            && row.newest_activity == Some(self.newest_activity)
    }
}
