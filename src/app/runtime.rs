//! Runs one backup from parsed CLI arguments and reports the outcome.

use anyhow::{Context, Result};
use media_backup::{Pipeline, Summary};
use tracing::{debug, info};

use crate::ProcessExit;
use crate::app::{config_runtime, exit_handler};
use crate::cli::Args;

pub(crate) async fn run_backup(args: Args) -> Result<ProcessExit> {
    config_runtime::init_tracing(config_runtime::resolve_default_log_level(&args));
    debug!(?args, "CLI arguments parsed");

    let config = config_runtime::resolve_config(&args)?;
    debug!(?config, "configuration resolved");
    info!(
        root = %config.root.display(),
        backup_root = %config.backup_root.display(),
        layout = config.layout.as_str(),
        "Media backup starting"
    );

    let pipeline = Pipeline::from_config(&config).context("Failed to prepare backup run")?;
    let summary = pipeline
        .execute()
        .await
        .context("Failed to write backup report")?;

    log_summary(&summary);
    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to encode summary")?;
        println!("{json}");
    }

    Ok(exit_handler::exit_outcome_for(&summary))
}

fn log_summary(summary: &Summary) {
    info!(
        local_copied = summary.local_copied,
        external_downloaded = summary.external_downloaded,
        external_failed = summary.external_failed,
        local_failed = summary.local_failed,
        missing_sources = summary.missing_sources,
        skipped_existing = summary.skipped_existing,
        retried = summary.retried,
        still_missing = summary.still_missing,
        scan_errors = summary.scan_errors,
        "Backup complete"
    );
}
