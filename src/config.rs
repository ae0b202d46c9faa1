//! Run configuration: built-in defaults, optional TOML file, resolved settings.
//!
//! Precedence is CLI flag > config file > built-in default. The binary layers
//! CLI values over a [`BackupConfig`] that already has the file applied.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::backup::{BackupLayout, FETCH_TIMEOUT_SECS};
use crate::pipeline::{MAX_ATTEMPTS_LIMIT, RetryPolicy};
use crate::reference::DEFAULT_MEDIA_EXTENSIONS;
use crate::scan::DEFAULT_TEXT_EXTENSIONS;

/// Directory name used under the XDG / `~/.config` base.
const APP_DIR: &str = "media-backup";

/// Default backup directory name under `$HOME`.
const DEFAULT_BACKUP_DIR: &str = "media_backup";

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// A numeric value is outside its accepted range.
    #[error("invalid config value for `{field}`: {value}. Expected range: {min}..={max}")]
    OutOfRange {
        /// Key name.
        field: &'static str,
        /// Rejected value.
        value: u64,
        /// Inclusive lower bound.
        min: u64,
        /// Inclusive upper bound.
        max: u64,
    },

    /// An extension list was present but empty.
    #[error("invalid config value for `{field}`: list must not be empty")]
    EmptyList {
        /// Key name.
        field: &'static str,
    },
}

impl ConfigError {
    /// Creates a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}

/// TOML-backed file configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Backup destination directory.
    pub backup_root: Option<PathBuf>,
    /// `flat` or `mirrored`.
    pub layout: Option<BackupLayout>,
    /// Extensions that identify media references and files.
    pub media_extensions: Option<Vec<String>>,
    /// Extensions of files searched for references.
    pub text_extensions: Option<Vec<String>>,
    /// Directory names pruned from the walk.
    pub exclude_dirs: Option<Vec<String>>,
    /// Collect media files found in the tree directly.
    pub collect_media_files: Option<bool>,
    /// HTTP connect and per-read timeout (1..=3600).
    pub fetch_timeout_secs: Option<u64>,
    /// Transfer passes including the first (1..=10).
    pub max_attempts: Option<u32>,
    /// Cap on network requests per run.
    pub max_remote_fetches: Option<usize>,
    /// Cap on each downloaded body, in bytes.
    pub max_download_bytes: Option<u64>,
}

impl FileConfig {
    /// Parses TOML text; `path` is used for error context only.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown keys, and
    /// the validation errors of [`FileConfig::validate`].
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::parse(path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise the
    /// errors of [`FileConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
        Self::from_toml_str(&text, path)
    }

    /// Validates values against the same ranges the CLI enforces.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range value or empty list found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_range("fetch_timeout_secs", self.fetch_timeout_secs, 1, 3600)?;
        validate_range(
            "max_attempts",
            self.max_attempts.map(u64::from),
            1,
            u64::from(MAX_ATTEMPTS_LIMIT),
        )?;
        validate_non_empty("media_extensions", self.media_extensions.as_deref())?;
        validate_non_empty("text_extensions", self.text_extensions.as_deref())?;
        Ok(())
    }
}

fn validate_range(
    field: &'static str,
    value: Option<u64>,
    min: u64,
    max: u64,
) -> Result<(), ConfigError> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(min..=max).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn validate_non_empty(field: &'static str, value: Option<&[String]>) -> Result<(), ConfigError> {
    match value {
        Some([]) => Err(ConfigError::EmptyList { field }),
        _ => Ok(()),
    }
}

/// Result of looking for a config file.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Path that was consulted, if one could be resolved.
    pub path: Option<PathBuf>,
    /// Parsed config when the file existed.
    pub config: Option<FileConfig>,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/media-backup/config.toml`
/// 2. `$HOME/.config/media-backup/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config at the default path. A missing file is not an error.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or is invalid.
pub fn load_default_file_config() -> Result<LoadedConfig, ConfigError> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig::default());
    };

    if !path_ref.exists() {
        debug!(path = %path_ref.display(), "no config file");
        return Ok(LoadedConfig { path, config: None });
    }

    let config = FileConfig::load(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
    })
}

/// `$HOME/media_backup`, or `./media_backup` when `HOME` is unset.
#[must_use]
pub fn default_backup_root() -> PathBuf {
    env_var_non_empty_os("HOME").map_or_else(
        || PathBuf::from(DEFAULT_BACKUP_DIR),
        |home| PathBuf::from(home).join(DEFAULT_BACKUP_DIR),
    )
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupConfig {
    /// Directory tree to scan.
    pub root: PathBuf,
    /// Backup destination directory.
    pub backup_root: PathBuf,
    /// Local file layout under the backup root.
    pub layout: BackupLayout,
    /// Media extensions, without dots.
    pub media_extensions: Vec<String>,
    /// Text-bearing extensions, without dots.
    pub text_extensions: Vec<String>,
    /// Directory names pruned from the walk.
    pub exclude_dirs: Vec<String>,
    /// Search text files for references.
    pub extract_references: bool,
    /// Collect media files found in the tree directly.
    pub collect_media_files: bool,
    /// HTTP connect and per-read timeout.
    pub fetch_timeout: Duration,
    /// Transfer pass budget.
    pub retry: RetryPolicy,
    /// Cap on network requests per run.
    pub max_remote_fetches: Option<usize>,
    /// Cap on each downloaded body, in bytes.
    pub max_download_bytes: Option<u64>,
}

impl BackupConfig {
    /// Built-in defaults for scanning `root` into `backup_root`.
    pub fn new(root: impl Into<PathBuf>, backup_root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            backup_root: backup_root.into(),
            layout: BackupLayout::default(),
            media_extensions: strings(DEFAULT_MEDIA_EXTENSIONS),
            text_extensions: strings(DEFAULT_TEXT_EXTENSIONS),
            exclude_dirs: Vec::new(),
            extract_references: true,
            collect_media_files: false,
            fetch_timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            max_remote_fetches: None,
            max_download_bytes: None,
        }
    }

    /// Overlays every key the file sets.
    #[must_use]
    pub fn with_file_config(mut self, file: &FileConfig) -> Self {
        if let Some(backup_root) = &file.backup_root {
            self.backup_root.clone_from(backup_root);
        }
        if let Some(layout) = file.layout {
            self.layout = layout;
        }
        if let Some(media) = &file.media_extensions {
            self.media_extensions.clone_from(media);
        }
        if let Some(text) = &file.text_extensions {
            self.text_extensions.clone_from(text);
        }
        if let Some(exclude) = &file.exclude_dirs {
            self.exclude_dirs.clone_from(exclude);
        }
        if let Some(collect) = file.collect_media_files {
            self.collect_media_files = collect;
        }
        if let Some(secs) = file.fetch_timeout_secs {
            self.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(max_attempts) = file.max_attempts {
            self.retry = RetryPolicy::with_max_attempts(max_attempts);
        }
        if file.max_remote_fetches.is_some() {
            self.max_remote_fetches = file.max_remote_fetches;
        }
        if file.max_download_bytes.is_some() {
            self.max_download_bytes = file.max_download_bytes;
        }
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<FileConfig, ConfigError> {
        FileConfig::from_toml_str(text, Path::new("config.toml"))
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        assert_eq!(parse("").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_full_file_parses() {
        let config = parse(
            r#"
backup_root = "/srv/backup"
layout = "mirrored"
media_extensions = ["png", "webp"]
exclude_dirs = ["node_modules", ".git"]
collect_media_files = true
fetch_timeout_secs = 30
max_attempts = 3
max_remote_fetches = 100
max_download_bytes = 1048576
"#,
        )
        .unwrap();
        assert_eq!(config.layout, Some(BackupLayout::Mirrored));
        assert_eq!(config.max_attempts, Some(3));
        assert_eq!(config.exclude_dirs.unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse("concurrency = 4").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_unknown_layout_rejected() {
        assert!(matches!(
            parse(r#"layout = "nested""#).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let err = parse("max_attempts = 11").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "max_attempts",
                ..
            }
        ));
        assert!(parse("fetch_timeout_secs = 0").is_err());
        assert!(parse("fetch_timeout_secs = 3601").is_err());
    }

    #[test]
    fn test_empty_extension_list_rejected() {
        assert!(matches!(
            parse("media_extensions = []").unwrap_err(),
            ConfigError::EmptyList { .. }
        ));
    }

    #[test]
    fn test_file_overlays_defaults() {
        let file = parse(
            r#"
backup_root = "/srv/backup"
max_attempts = 4
fetch_timeout_secs = 5
"#,
        )
        .unwrap();
        let config = BackupConfig::new("/p", "/home/u/media_backup").with_file_config(&file);
        assert_eq!(config.backup_root, PathBuf::from("/srv/backup"));
        assert_eq!(config.retry.max_attempts(), 4);
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.layout, BackupLayout::Flat);
        assert!(config.media_extensions.contains(&"png".to_string()));
    }

    #[test]
    fn test_defaults() {
        let config = BackupConfig::new("/p", "/b");
        assert_eq!(config.fetch_timeout, Duration::from_secs(15));
        assert_eq!(config.retry.max_attempts(), 2);
        assert!(config.extract_references);
        assert!(!config.collect_media_files);
        assert!(config.exclude_dirs.is_empty());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = FileConfig::load(Path::new("/nonexistent/media-backup.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
