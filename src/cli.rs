//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use media_backup::BackupLayout;

/// Back up every media file a project references.
///
/// Scans the project for quoted media paths, bare media URLs, Markdown images
/// and CSS `url(...)` values, then copies local files and downloads remote
/// ones into a single backup directory. Runs with no arguments over the
/// current directory.
#[derive(Parser, Debug)]
#[command(name = "media-backup")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Project directory to scan (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Backup destination (default: ~/media_backup)
    #[arg(long, value_name = "DIR")]
    pub backup_root: Option<PathBuf>,

    /// How local files are arranged under the backup root
    #[arg(long, value_enum)]
    pub layout: Option<LayoutArg>,

    /// Copy media files found in the tree instead of extracting references
    #[arg(long)]
    pub copy_only: bool,

    /// Transfer passes including the first (1-10)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_attempts: Option<u32>,

    /// Config file (default: $XDG_CONFIG_HOME/media-backup/config.toml)
    #[arg(long, value_name = "FILE", conflicts_with = "no_config")]
    pub config: Option<PathBuf>,

    /// Ignore any config file
    #[arg(long)]
    pub no_config: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// `--layout` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    /// backup_root/<basename>
    Flat,
    /// backup_root/<path relative to the project root>
    Mirrored,
}

impl From<LayoutArg> for BackupLayout {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Flat => Self::Flat,
            LayoutArg::Mirrored => Self::Mirrored,
        }
    }
}
