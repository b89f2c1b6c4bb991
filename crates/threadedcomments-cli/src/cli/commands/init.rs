//! Implementation of `threadedcomments init`.

use anyhow::{Context, Result};

use crate::cli::commands::helpers::context;
use crate::settings::Settings;

/// Create the database file and schema.
///
/// Safe to run on an existing database; the schema is created only if absent.
#[tracing::instrument(skip(settings))]
pub fn run_init(settings: &Settings) -> Result<()> {
    let ctx = context(settings)?;
    let existed = ctx.db_path().exists();

    let store = ctx
        .open_store()
        .with_context(|| format!("Failed to initialize {}", ctx.db_path().display()))?;
    ctx.config().check_capacity(store.max_id()?)?;

    if existed {
        println!("Already initialized: {}", ctx.db_path().display());
    } else {
        println!("Initialized threadedcomments in {}", ctx.db_path().display());
    }
    Ok(())
}
