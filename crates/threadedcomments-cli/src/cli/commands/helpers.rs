//! Shared helpers for CLI commands.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::settings::Settings;
use threadedcomments_core::config::TreeConfig;
use threadedcomments_core::core::{CommentServices, CoreContext};
use threadedcomments_core::store::Comment;

/// Build the core context from loaded settings.
pub fn context(settings: &Settings) -> Result<CoreContext> {
    let ctx = CoreContext::new(&settings.database.path, settings.tree.clone())
        .context("Invalid tree settings")?;
    Ok(ctx.with_busy_timeout(settings.database.busy_timeout()))
}

/// Open the database and return ready-to-use services.
///
/// Fails if the configured `path_digits` cannot hold the ids already stored.
pub fn open_services(settings: &Settings) -> Result<CommentServices> {
    let ctx = context(settings)?;
    ctx.services()
        .with_context(|| format!("Failed to open {}", ctx.db_path().display()))
}

/// One line of the comment listing: the text, the object it belongs to,
/// the author, and its visibility flags.
#[derive(Debug, Clone, Serialize)]
pub struct CommentRow {
    pub id: i64,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    pub comment: String,
    pub content_object: String,
    pub user: String,
    pub flags: String,
}

impl CommentRow {
    #[must_use]
    pub fn from_comment(comment: &Comment, config: &TreeConfig) -> Self {
        Self {
            id: comment.id,
            depth: comment.depth(config),
            parent_id: comment.parent_id,
            comment: comment.comment.clone(),
            content_object: comment.content_object.clone(),
            user: comment.user_name.clone(),
            flags: flags(comment),
        }
    }
}

fn flags(comment: &Comment) -> String {
    let mut flags = Vec::new();
    if !comment.is_public {
        flags.push("hidden");
    }
    if comment.is_removed {
        flags.push("removed");
    }
    if flags.is_empty() {
        "public".to_string()
    } else {
        flags.join(",")
    }
}

/// Actionable "comment not found" error.
pub fn comment_not_found_error(id: i64) -> anyhow::Error {
    anyhow::anyhow!("Comment not found: {id}\n  To fix: threadedcomments list")
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadedcomments_core::store::{CommentStore, NewComment};
    use threadedcomments_core::tree::CreateOptions;

    #[test]
    fn test_comment_row_flags_and_depth() {
        let store = CommentStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        let services = CommentServices::new(store, TreeConfig::default()).unwrap();
        let comments = services.comments();

        let root = comments
            .post(NewComment::new("post:1", "alice", "root"), CreateOptions::default())
            .unwrap();
        let mut hidden = NewComment::new("post:1", "bob", "reply").reply_to(root.id);
        hidden.is_public = false;
        let reply = comments.post(hidden, CreateOptions::default()).unwrap();

        let config = TreeConfig::default();
        let root_row = CommentRow::from_comment(&root, &config);
        assert_eq!(root_row.depth, 1);
        assert_eq!(root_row.flags, "public");
        assert_eq!(root_row.user, "alice");

        let reply_row = CommentRow::from_comment(&reply, &config);
        assert_eq!(reply_row.depth, 2);
        assert_eq!(reply_row.parent_id, Some(root.id));
        assert_eq!(reply_row.flags, "hidden");
    }
}
