//! Project tree scan: walk, decode, extract, classify.
//!
//! The scanner walks the project root, reads every text-bearing file as lossy
//! UTF-8 and runs each configured [`ReferenceExtractor`] over it. Raw captures
//! are classified against the root and collected into a [`ReferenceSet`].
//! Optionally, media files found in the tree are collected directly.
//!
//! The walk is synchronous and runs in program order; the pipeline never has
//! more than one file open.

mod error;

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use walkdir::{DirEntry, WalkDir};

pub use error::ScanError;

use crate::reference::{ReferenceExtractor, ReferenceSet, classify};

/// File extensions scanned for references when no configuration overrides them.
pub const DEFAULT_TEXT_EXTENSIONS: &[&str] = &[
    "js", "ts", "jsx", "tsx", "mjs", "cjs", "html", "htm", "css", "scss", "md", "mdx", "json",
    "txt", "xml", "yml", "yaml", "vue", "svelte",
];

/// Result of one scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Every classified, deduplicated reference.
    pub references: ReferenceSet,
    /// Number of text files read and searched.
    pub files_scanned: usize,
    /// Files or directories that could not be processed.
    pub errors: Vec<ScanError>,
}

/// Walks a project tree and collects media references.
pub struct Scanner {
    root: PathBuf,
    extractors: Vec<Box<dyn ReferenceExtractor>>,
    media_extensions: HashSet<String>,
    text_extensions: HashSet<String>,
    exclude_dirs: HashSet<String>,
    skip_paths: Vec<PathBuf>,
    extract_references: bool,
    collect_media_files: bool,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("root", &self.root)
            .field(
                "extractors",
                &self.extractors.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .field("extract_references", &self.extract_references)
            .field("collect_media_files", &self.collect_media_files)
            .finish_non_exhaustive()
    }
}

fn lowercase_set<S: AsRef<str>>(items: &[S]) -> HashSet<String> {
    items
        .iter()
        .map(|s| s.as_ref().trim_start_matches('.').to_ascii_lowercase())
        .collect()
}

impl Scanner {
    /// Creates a scanner over `root`, which must be absolute and canonical.
    #[must_use]
    pub fn new(
        root: impl Into<PathBuf>,
        extractors: Vec<Box<dyn ReferenceExtractor>>,
        media_extensions: &[String],
        text_extensions: &[String],
    ) -> Self {
        Self {
            root: root.into(),
            extractors,
            media_extensions: lowercase_set(media_extensions),
            text_extensions: lowercase_set(text_extensions),
            exclude_dirs: HashSet::new(),
            skip_paths: Vec::new(),
            extract_references: true,
            collect_media_files: false,
        }
    }

    /// Directory names pruned wherever they occur (e.g. `node_modules`).
    #[must_use]
    pub fn with_exclude_dirs(mut self, names: &[String]) -> Self {
        self.exclude_dirs = names.iter().cloned().collect();
        self
    }

    /// Absolute directory never descended into, typically the backup root.
    #[must_use]
    pub fn skip_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.skip_paths.push(path.into());
        self
    }

    /// Whether text files are searched for references (default: on).
    #[must_use]
    pub fn extract_references(mut self, enabled: bool) -> Self {
        self.extract_references = enabled;
        self
    }

    /// Whether media files in the tree are collected directly (default: off).
    #[must_use]
    pub fn collect_media_files(mut self, enabled: bool) -> Self {
        self.collect_media_files = enabled;
        self
    }

    /// Returns the scan root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walks the tree and returns everything found.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn scan(&self) -> ScanOutcome {
        info!("Scanning for media references");
        let mut outcome = ScanOutcome::default();

        let walker = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| !self.is_pruned(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "directory walk error");
                    outcome.errors.push(ScanError::walk(&self.root, &e));
                    continue;
                }
            };

            if !entry.path().is_file() {
                continue;
            }

            let Some(ext) = lowercase_extension(entry.path()) else {
                continue;
            };

            if self.collect_media_files && self.media_extensions.contains(&ext) {
                self.collect_media_file(&entry, &mut outcome);
            }

            if self.extract_references && self.text_extensions.contains(&ext) {
                self.scan_text_file(entry.path(), &mut outcome);
            }
        }

        info!(
            local = outcome.references.local_len(),
            remote = outcome.references.remote_len(),
            files_scanned = outcome.files_scanned,
            scan_errors = outcome.errors.len(),
            "Scan complete"
        );
        outcome
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let by_name = entry
            .file_name()
            .to_str()
            .is_some_and(|name| self.exclude_dirs.contains(name));
        let by_path = self.skip_paths.iter().any(|p| entry.path() == p);
        if by_name || by_path {
            debug!(dir = %entry.path().display(), "pruning directory");
        }
        by_name || by_path
    }

    fn collect_media_file(&self, entry: &DirEntry, outcome: &mut ScanOutcome) {
        let name = entry.file_name().to_string_lossy();
        if let Some(reference) = classify(&name, entry.path(), &self.root) {
            outcome.references.insert(reference);
        }
    }

    fn scan_text_file(&self, path: &Path, outcome: &mut ScanOutcome) {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read file, skipping");
                outcome.errors.push(ScanError::read(path, e));
                return;
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        outcome.files_scanned += 1;

        let mut found = 0usize;
        for extractor in &self.extractors {
            for raw in extractor.extract(&text) {
                if let Some(reference) = classify(raw, path, &self.root) {
                    found += 1;
                    outcome.references.insert(reference);
                }
            }
        }
        if found > 0 {
            debug!(path = %path.display(), found, "references extracted");
        }
    }
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
}
