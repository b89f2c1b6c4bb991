//! CLI command definitions and handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;

/// Threaded comments backed by a materialized-path tree
#[derive(Parser, Debug)]
#[command(name = "threadedcomments")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Database file (overrides database.path from settings)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Settings file (default: ./threadedcomments.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and schema
    Init,

    /// Post a comment, or a reply with --parent
    Post {
        /// Key of the object being commented on (inherited from --parent if omitted)
        #[arg(long = "object")]
        content_object: Option<String>,

        /// Author name
        #[arg(long)]
        user: String,

        /// Author email
        #[arg(long)]
        email: Option<String>,

        /// Author URL
        #[arg(long)]
        url: Option<String>,

        /// Client IP address
        #[arg(long)]
        ip: Option<String>,

        /// Id of the comment being replied to
        #[arg(long)]
        parent: Option<i64>,

        /// Post as non-public
        #[arg(long)]
        hidden: bool,

        /// Insert the row only, without tree bookkeeping (bulk import)
        #[arg(long)]
        skip_tree_path: bool,

        /// Comment body
        message: String,
    },

    /// Delete a comment and all of its replies
    Delete {
        /// Comment ID
        id: i64,
    },

    /// Show a comment with its depth, root, and ancestors
    Show {
        /// Comment ID
        id: i64,
    },

    /// List comments in thread order
    List {
        /// Only comments on this object
        #[arg(long = "object", conflicts_with = "root")]
        content_object: Option<String>,

        /// Only this comment and its replies
        #[arg(long)]
        root: Option<i64>,
    },

    /// Recompute tree paths, last child, and activity for every comment
    RebuildPaths,

    /// Check tree bookkeeping for consistency
    Check,
}
