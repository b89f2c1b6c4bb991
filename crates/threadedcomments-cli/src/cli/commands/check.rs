//! Implementation of `threadedcomments check`.

use anyhow::Result;

use crate::cli::commands::helpers::open_services;
use crate::output::{Formatter, OutputFormat};
use crate::settings::Settings;

/// Verify tree bookkeeping and exit non-zero if any check fails.
#[tracing::instrument(skip(settings, format))]
pub fn run_check(settings: &Settings, format: OutputFormat) -> Result<()> {
    let services = open_services(settings)?;
    let report = services.health().check()?;

    Formatter::new(format).print(&report)?;

    if !report.healthy {
        std::process::exit(1);
    }
    Ok(())
}
