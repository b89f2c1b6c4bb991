//! threadedcomments - threaded comments on a materialized-path tree

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use threadedcomments_cli::cli::commands::{
    run_check, run_delete, run_init, run_list, run_post, run_rebuild_paths, run_show, PostArgs,
};
use threadedcomments_cli::cli::{Cli, Commands};
use threadedcomments_cli::output::OutputFormat;
use threadedcomments_cli::settings::Settings;

/// Logs go to stderr so stdout stays parseable.
fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(db) = cli.db {
        settings.database.path = db;
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Commands::Init => run_init(&settings)?,

        Commands::Post {
            content_object,
            user,
            email,
            url,
            ip,
            parent,
            hidden,
            skip_tree_path,
            message,
        } => {
            let args = PostArgs {
                content_object,
                user,
                email,
                url,
                ip,
                parent,
                hidden,
                skip_tree_path,
                message,
            };
            run_post(&settings, args, format)?;
        }

        Commands::Delete { id } => run_delete(&settings, id, format)?,

        Commands::Show { id } => run_show(&settings, id, format)?,

        Commands::List {
            content_object,
            root,
        } => run_list(&settings, content_object.as_deref(), root, format)?,

        Commands::RebuildPaths => run_rebuild_paths(&settings, format)?,

        Commands::Check => run_check(&settings, format)?,
    }

    Ok(())
}
