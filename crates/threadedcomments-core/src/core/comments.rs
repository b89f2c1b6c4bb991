//! Comment service - post, reply, delete, get, list.

use crate::store::{self, Comment, CommentStore, NewComment};
use crate::tree::{CreateOptions, TreeManager};

use super::{CoreError, CoreResult};

/// Service for comment operations.
pub struct CommentService<'a> {
    store: &'a CommentStore,
    tree: &'a TreeManager,
}

impl<'a> CommentService<'a> {
    pub(crate) const fn new(store: &'a CommentStore, tree: &'a TreeManager) -> Self {
        Self { store, tree }
    }

    /// Post a comment, as a reply when `new.parent_id` is set.
    ///
    /// A reply with an empty `content_object` takes its parent's; a reply
    /// naming a different object is rejected. A parent that does not exist
    /// is left for the store to reject.
    pub fn post(&self, mut new: NewComment, options: CreateOptions) -> CoreResult<Comment> {
        new.user_name = new.user_name.trim().to_string();
        if new.user_name.is_empty() {
            return Err(CoreError::Validation {
                message: "user name is required".to_string(),
            });
        }
        if new.comment.trim().is_empty() {
            return Err(CoreError::Validation {
                message: "comment body is required".to_string(),
            });
        }

        if let Some(parent_id) = new.parent_id {
            if let Some(parent) = store::comment_by_id(self.store.conn(), parent_id)? {
                if new.content_object.is_empty() {
                    new.content_object = parent.content_object;
                } else if new.content_object != parent.content_object {
                    return Err(CoreError::Validation {
                        message: format!(
                            "reply targets {:?} but comment {parent_id} belongs to {:?}",
                            new.content_object, parent.content_object
                        ),
                    });
                }
            }
        }
        if new.content_object.is_empty() {
            return Err(CoreError::Validation {
                message: "content object is required".to_string(),
            });
        }

        self.tree.create(self.store, &new, options)
    }

    /// Delete a comment and its replies.
    ///
    /// Returns `Err(CoreError::CommentNotFound)` if the comment does not exist.
    pub fn delete(&self, id: i64) -> CoreResult<Comment> {
        self.tree.delete(self.store, id)
    }

    /// Get a single comment.
    ///
    /// Returns `Err(CoreError::CommentNotFound)` if the comment does not exist.
    pub fn get(&self, id: i64) -> CoreResult<Comment> {
        self.get_optional(id)?
            .ok_or(CoreError::CommentNotFound { id })
    }

    /// Get a single comment, returning `None` if not found.
    pub fn get_optional(&self, id: i64) -> CoreResult<Option<Comment>> {
        Ok(store::comment_by_id(self.store.conn(), id)?)
    }

    /// List comments in tree order, optionally only those on one object.
    pub fn list(&self, content_object: Option<&str>) -> CoreResult<Vec<Comment>> {
        let rows = match content_object {
            Some(key) => store::list_for_object(self.store.conn(), key)?,
            None => store::list_all(self.store.conn())?,
        };
        Ok(rows)
    }
}
