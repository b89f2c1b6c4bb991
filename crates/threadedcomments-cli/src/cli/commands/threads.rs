//! Implementation of `show`, `list` and `rebuild-paths`.

use anyhow::Result;

use crate::cli::commands::helpers::{comment_not_found_error, open_services, CommentRow};
use crate::output::{Formatter, OutputFormat};
use crate::settings::Settings;
use threadedcomments_core::core::CoreError;

/// Show one comment with its position in the tree.
#[tracing::instrument(skip(settings, format))]
pub fn run_show(settings: &Settings, id: i64, format: OutputFormat) -> Result<()> {
    let services = open_services(settings)?;
    let position = match services.threads().position(id) {
        Ok(position) => position,
        Err(CoreError::CommentNotFound { id }) => return Err(comment_not_found_error(id)),
        Err(e) => return Err(e.into()),
    };
    Formatter::new(format).print(&position)?;
    Ok(())
}

/// List comments in tree order.
///
/// With `root` set, lists that comment and its replies only.
#[tracing::instrument(skip(settings, format))]
pub fn run_list(
    settings: &Settings,
    content_object: Option<&str>,
    root: Option<i64>,
    format: OutputFormat,
) -> Result<()> {
    let services = open_services(settings)?;
    let comments = match root {
        Some(id) => match services.threads().thread(id) {
            Ok(rows) => rows,
            Err(CoreError::CommentNotFound { id }) => return Err(comment_not_found_error(id)),
            Err(e) => return Err(e.into()),
        },
        None => services.comments().list(content_object)?,
    };

    let config = services.tree().config();
    let rows: Vec<CommentRow> = comments
        .iter()
        .map(|c| CommentRow::from_comment(c, config))
        .collect();

    Formatter::new(format).print_list(&rows, "No comments found", "comments")?;
    Ok(())
}

/// Recompute tree bookkeeping for every comment.
#[tracing::instrument(skip(settings, format))]
pub fn run_rebuild_paths(settings: &Settings, format: OutputFormat) -> Result<()> {
    let services = open_services(settings)?;
    let changed = services.threads().rebuild_paths()?;
    let total = services.comments().list(None)?.len();

    Formatter::new(format).print(&serde_json::json!({
        "comments": total,
        "changed": changed,
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::comments::{run_post, PostArgs};
    use crate::settings::DatabaseSettings;
    use tempfile::{tempdir, TempDir};
    use threadedcomments_core::config::TreeConfig;

    fn settings() -> (TempDir, Settings) {
        let dir = tempdir().unwrap();
        let settings = Settings {
            database: DatabaseSettings {
                path: dir.path().join("comments.db"),
                busy_timeout_ms: 1000,
            },
            tree: TreeConfig::default(),
        };
        (dir, settings)
    }

    fn post(settings: &Settings, parent: Option<i64>, message: &str) {
        let args = PostArgs {
            content_object: parent.is_none().then(|| "post:1".to_string()),
            user: "alice".to_string(),
            parent,
            message: message.to_string(),
            ..PostArgs::default()
        };
        run_post(settings, args, OutputFormat::Json).unwrap();
    }

    #[test]
    fn test_commands_against_file_database() {
        let (_dir, settings) = settings();
        post(&settings, None, "root");
        post(&settings, Some(1), "reply");

        run_show(&settings, 2, OutputFormat::Text).unwrap();
        run_list(&settings, Some("post:1"), None, OutputFormat::Json).unwrap();
        run_list(&settings, None, Some(1), OutputFormat::Text).unwrap();
        run_rebuild_paths(&settings, OutputFormat::Json).unwrap();

        let services = open_services(&settings).unwrap();
        let thread = services.threads().thread(1).unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[1].tree_path, "0000000001/0000000002");
    }

    #[test]
    fn test_missing_comment_is_reported() {
        let (_dir, settings) = settings();
        post(&settings, None, "root");

        let err = run_show(&settings, 99, OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("Comment not found: 99"));
        assert!(run_list(&settings, None, Some(42), OutputFormat::Text).is_err());
    }
}
