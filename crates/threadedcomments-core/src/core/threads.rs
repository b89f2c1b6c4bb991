//! Thread service - navigation queries and path maintenance.

use serde::Serialize;

use crate::store::{self, Comment, CommentStore};
use crate::tree::TreeManager;

use super::{CoreError, CoreResult};

/// A comment with its derived position in the tree.
#[derive(Debug, Clone, Serialize)]
pub struct CommentPosition {
    #[serde(flatten)]
    pub comment: Comment,
    pub depth: usize,
    pub root_id: i64,
    /// Ancestor ids, root first.
    pub root_path: Vec<i64>,
}

/// Service for thread operations.
pub struct ThreadService<'a> {
    store: &'a CommentStore,
    tree: &'a TreeManager,
}

impl<'a> ThreadService<'a> {
    pub(crate) const fn new(store: &'a CommentStore, tree: &'a TreeManager) -> Self {
        Self { store, tree }
    }

    fn require(&self, id: i64) -> CoreResult<Comment> {
        store::comment_by_id(self.store.conn(), id)?.ok_or(CoreError::CommentNotFound { id })
    }

    /// A comment followed by all of its replies, in tree order.
    ///
    /// Called with a root id this is the whole thread.
    pub fn thread(&self, id: i64) -> CoreResult<Vec<Comment>> {
        let head = self.require(id)?;
        let mut rows = self.tree.descendants(self.store.conn(), &head)?;
        rows.insert(0, head);
        Ok(rows)
    }

    /// Direct replies to a comment, in tree order.
    pub fn children(&self, id: i64) -> CoreResult<Vec<Comment>> {
        self.require(id)?;
        Ok(store::children(self.store.conn(), id)?)
    }

    /// Ancestors of a comment, root first.
    pub fn root_path(&self, id: i64) -> CoreResult<Vec<Comment>> {
        let comment = self.require(id)?;
        self.tree.root_path(self.store.conn(), &comment)
    }

    /// A comment together with its depth, root id and ancestor ids.
    pub fn position(&self, id: i64) -> CoreResult<CommentPosition> {
        let comment = self.require(id)?;
        let config = self.tree.config();
        Ok(CommentPosition {
            depth: comment.depth(config),
            root_id: comment.root_id(config)?,
            root_path: comment.ancestor_ids(config)?,
            comment,
        })
    }

    /// Recompute all tree bookkeeping. Returns the number of rows changed.
    pub fn rebuild_paths(&self) -> CoreResult<usize> {
        self.tree.rebuild_paths(self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::core::CommentServices;
    use crate::store::NewComment;
    use crate::tree::CreateOptions;

    fn services() -> CommentServices {
        let store = CommentStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        CommentServices::new(store, TreeConfig::default()).unwrap()
    }

    fn seed(services: &CommentServices) {
        // 1
        // ├── 2
        // │   └── 4
        // └── 3
        // 5
        let comments = services.comments();
        let opts = CreateOptions::default();
        comments.post(NewComment::new("p", "a", "one"), opts).unwrap();
        comments.post(NewComment::new("p", "b", "two").reply_to(1), opts).unwrap();
        comments.post(NewComment::new("p", "c", "three").reply_to(1), opts).unwrap();
        comments.post(NewComment::new("p", "d", "four").reply_to(2), opts).unwrap();
        comments.post(NewComment::new("p", "e", "five"), opts).unwrap();
    }

    fn ids(rows: &[Comment]) -> Vec<i64> {
        rows.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_thread_is_preorder() {
        let services = services();
        seed(&services);
        let threads = services.threads();

        assert_eq!(ids(&threads.thread(1).unwrap()), vec![1, 2, 4, 3]);
        assert_eq!(ids(&threads.thread(2).unwrap()), vec![2, 4]);
        assert_eq!(ids(&threads.thread(5).unwrap()), vec![5]);
    }

    #[test]
    fn test_children() {
        let services = services();
        seed(&services);

        assert_eq!(ids(&services.threads().children(1).unwrap()), vec![2, 3]);
        assert!(services.threads().children(4).unwrap().is_empty());
        assert!(matches!(
            services.threads().children(99),
            Err(CoreError::CommentNotFound { id: 99 })
        ));
    }

    #[test]
    fn test_position() {
        let services = services();
        seed(&services);

        let pos = services.threads().position(4).unwrap();
        assert_eq!(pos.depth, 3);
        assert_eq!(pos.root_id, 1);
        assert_eq!(pos.root_path, vec![1, 2]);
        assert_eq!(pos.comment.tree_path, "0000000001/0000000002/0000000004");

        let json = serde_json::to_value(&pos).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["depth"], 3);
    }

    #[test]
    fn test_root_path_is_repeatable() {
        let services = services();
        seed(&services);
        let threads = services.threads();

        let first = ids(&threads.root_path(4).unwrap());
        let second = ids(&threads.root_path(4).unwrap());
        assert_eq!(first, vec![1, 2]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_thread_of_unassigned_comment() {
        let services = services();
        services
            .comments()
            .post(
                NewComment::new("p", "a", "raw"),
                CreateOptions {
                    skip_tree_path: true,
                },
            )
            .unwrap();

        assert!(matches!(
            services.threads().thread(1),
            Err(CoreError::MalformedPath { .. })
        ));
        assert_eq!(services.threads().rebuild_paths().unwrap(), 1);
        assert_eq!(ids(&services.threads().thread(1).unwrap()), vec![1]);
    }
}
