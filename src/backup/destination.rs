//! Backup destination derivation.
//!
//! Destinations are a pure function of the reference, the backup root and the
//! layout. In the flat layout identity is basename-only: two different source
//! files named `logo.png` map to the same destination, and whichever is
//! processed second is reported as already existing.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::reference::MediaReference;

/// How local files are arranged under the backup root.
///
/// Remote files are always placed flat, by URL filename.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupLayout {
    /// `backup_root/<basename>`. Files sharing a basename collide.
    #[default]
    Flat,
    /// `backup_root/<path relative to scan root>`.
    Mirrored,
}

impl BackupLayout {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Mirrored => "mirrored",
        }
    }
}

/// Computes where each reference lands in the backup root.
#[derive(Debug, Clone)]
pub struct DestinationPlanner {
    backup_root: PathBuf,
    scan_root: PathBuf,
    layout: BackupLayout,
}

impl DestinationPlanner {
    /// Creates a planner. Both roots should be absolute.
    pub fn new(
        backup_root: impl Into<PathBuf>,
        scan_root: impl Into<PathBuf>,
        layout: BackupLayout,
    ) -> Self {
        Self {
            backup_root: backup_root.into(),
            scan_root: scan_root.into(),
            layout,
        }
    }

    /// Returns the backup root.
    #[must_use]
    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    /// Returns the configured layout.
    #[must_use]
    pub fn layout(&self) -> BackupLayout {
        self.layout
    }

    /// Returns the destination for `reference`, or `None` if no safe name
    /// can be derived.
    #[must_use]
    pub fn destination(&self, reference: &MediaReference) -> Option<PathBuf> {
        match reference {
            MediaReference::Local { path, .. } => self.local_destination(path),
            MediaReference::Remote { url } => {
                remote_filename(url).map(|name| self.backup_root.join(name))
            }
        }
    }

    fn local_destination(&self, source: &Path) -> Option<PathBuf> {
        match self.layout {
            BackupLayout::Flat => {
                let name = source.file_name()?.to_string_lossy();
                let name = sanitize_filename(&name);
                is_safe_filename_segment(&name).then(|| self.backup_root.join(name))
            }
            BackupLayout::Mirrored => {
                let relative = source.strip_prefix(&self.scan_root).ok()?;
                let clean = relative
                    .components()
                    .all(|c| matches!(c, Component::Normal(_)));
                (clean && relative.file_name().is_some())
                    .then(|| self.backup_root.join(relative))
            }
        }
    }
}

/// Filename a URL is saved under: the last `/` segment with the query string
/// and fragment removed, sanitized for the filesystem.
///
/// Returns `None` when nothing usable remains (e.g. `https://host/`).
#[must_use]
pub fn remote_filename(url: &str) -> Option<String> {
    let last = url.rsplit('/').next().unwrap_or(url);
    let name = last.split(['?', '#']).next().unwrap_or(last);
    if name.is_empty() {
        return None;
    }
    let name = sanitize_filename(name);
    is_safe_filename_segment(&name).then_some(name)
}

/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

fn is_safe_filename_segment(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}
