//! Implementation of `threadedcomments post` and `threadedcomments delete`.

use anyhow::Result;

use crate::cli::commands::helpers::{comment_not_found_error, open_services, CommentRow};
use crate::output::{Formatter, OutputFormat};
use crate::settings::Settings;
use threadedcomments_core::core::CoreError;
use threadedcomments_core::store::NewComment;
use threadedcomments_core::tree::CreateOptions;

/// Arguments for `post`, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct PostArgs {
    pub content_object: Option<String>,
    pub user: String,
    pub email: Option<String>,
    pub url: Option<String>,
    pub ip: Option<String>,
    pub parent: Option<i64>,
    pub hidden: bool,
    pub skip_tree_path: bool,
    pub message: String,
}

impl PostArgs {
    fn into_new_comment(self) -> NewComment {
        let mut new = NewComment::new(
            self.content_object.as_deref().unwrap_or_default(),
            &self.user,
            &self.message,
        );
        new.parent_id = self.parent;
        new.user_email = self.email;
        new.user_url = self.url;
        new.ip_address = self.ip;
        new.is_public = !self.hidden;
        new
    }
}

/// Post a comment or a reply.
#[tracing::instrument(skip(settings, args, format), fields(parent = ?args.parent))]
pub fn run_post(settings: &Settings, args: PostArgs, format: OutputFormat) -> Result<()> {
    let services = open_services(settings)?;

    if let Some(parent_id) = args.parent {
        if services.comments().get_optional(parent_id)?.is_none() {
            return Err(comment_not_found_error(parent_id));
        }
    }

    let options = CreateOptions {
        skip_tree_path: args.skip_tree_path,
    };
    let comment = services.comments().post(args.into_new_comment(), options)?;

    let output = serde_json::json!({
        "id": comment.id,
        "parent_id": comment.parent_id,
        "tree_path": comment.tree_path,
        "content_object": comment.content_object,
        "submit_date": comment.submit_date,
    });
    Formatter::new(format).print(&output)?;
    Ok(())
}

/// Delete a comment and its replies.
#[tracing::instrument(skip(settings, format))]
pub fn run_delete(settings: &Settings, id: i64, format: OutputFormat) -> Result<()> {
    let services = open_services(settings)?;
    let config = services.tree().config().clone();

    let removed = match services.comments().delete(id) {
        Ok(comment) => comment,
        Err(CoreError::CommentNotFound { id }) => return Err(comment_not_found_error(id)),
        Err(e) => return Err(e.into()),
    };

    Formatter::new(format).print(&serde_json::json!({
        "deleted": CommentRow::from_comment(&removed, &config),
    }))?;
    Ok(())
}
