//! Resolves the run configuration and logging from CLI flags and the config file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use media_backup::config::{self, BackupConfig, FileConfig};
use media_backup::{BackupLayout, RetryPolicy};
use tracing::debug;

use crate::cli::Args;

/// Default log level from `-q`/`-v`. `RUST_LOG` still takes priority.
pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Initializes the stderr subscriber, keeping stdout free for `--json`.
pub(crate) fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

/// Loads the config file selected by `--config` / `--no-config`.
fn load_file_config(args: &Args) -> Result<Option<FileConfig>> {
    if args.no_config {
        debug!("config file disabled");
        return Ok(None);
    }
    if let Some(path) = &args.config {
        let file = FileConfig::load(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        return Ok(Some(file));
    }
    let loaded = config::load_default_file_config().context("Failed to load config file")?;
    if let (Some(path), Some(_)) = (&loaded.path, &loaded.config) {
        debug!(path = %path.display(), "config file loaded");
    }
    Ok(loaded.config)
}

/// Applies built-in defaults, then the config file, then CLI flags.
pub(crate) fn resolve_config(args: &Args) -> Result<BackupConfig> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let mut resolved = BackupConfig::new(root, config::default_backup_root());
    if let Some(file) = load_file_config(args)? {
        resolved = resolved.with_file_config(&file);
    }
    Ok(apply_cli_overrides(resolved, args))
}

fn apply_cli_overrides(mut resolved: BackupConfig, args: &Args) -> BackupConfig {
    if let Some(backup_root) = &args.backup_root {
        resolved.backup_root = absolute(backup_root);
    }
    if let Some(layout) = args.layout {
        resolved.layout = BackupLayout::from(layout);
    }
    if let Some(max_attempts) = args.max_attempts {
        resolved.retry = RetryPolicy::with_max_attempts(max_attempts);
    }
    if args.copy_only {
        resolved.extract_references = false;
        resolved.collect_media_files = true;
    }
    resolved
}

fn absolute(path: &std::path::Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["media-backup"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_log_level_from_flags() {
        assert_eq!(resolve_default_log_level(&args(&[])), "info");
        assert_eq!(resolve_default_log_level(&args(&["-v"])), "debug");
        assert_eq!(resolve_default_log_level(&args(&["-vvv"])), "trace");
        assert_eq!(resolve_default_log_level(&args(&["-q", "-v"])), "error");
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let file = FileConfig {
            layout: Some(BackupLayout::Flat),
            max_attempts: Some(5),
            ..FileConfig::default()
        };
        let base = BackupConfig::new("/p", "/b").with_file_config(&file);
        let resolved = apply_cli_overrides(
            base,
            &args(&["--layout", "mirrored", "--max-attempts", "1", "--backup-root", "/out"]),
        );
        assert_eq!(resolved.layout, BackupLayout::Mirrored);
        assert_eq!(resolved.retry.max_attempts(), 1);
        assert_eq!(resolved.backup_root, PathBuf::from("/out"));
    }

    #[test]
    fn test_file_values_kept_without_flags() {
        let file = FileConfig {
            max_attempts: Some(5),
            ..FileConfig::default()
        };
        let base = BackupConfig::new("/p", "/b").with_file_config(&file);
        let resolved = apply_cli_overrides(base, &args(&[]));
        assert_eq!(resolved.retry.max_attempts(), 5);
        assert_eq!(resolved.layout, BackupLayout::Flat);
    }

    #[test]
    fn test_copy_only_switches_scan_mode() {
        let resolved = apply_cli_overrides(BackupConfig::new("/p", "/b"), &args(&["--copy-only"]));
        assert!(!resolved.extract_references);
        assert!(resolved.collect_media_files);
    }

    #[test]
    fn test_no_config_skips_file() {
        assert!(load_file_config(&args(&["--no-config"])).unwrap().is_none());
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let result = load_file_config(&args(&["--config", "/nonexistent/media-backup.toml"]));
        assert!(result.is_err());
    }
}
