//! Media references and the pipeline's deduplicating reference set.
//!
//! A [`MediaReference`] is either a file inside the scanned project
//! ([`MediaReference::Local`]) or a remote URL ([`MediaReference::Remote`]).
//! Identity is the resolved path or the literal URL string; the raw spelling a
//! local reference was first found under is kept for display only.

mod classifier;
pub mod extractor;

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

pub use classifier::{classify, is_remote, normalize_lexically};
pub use extractor::{
    BareUrlExtractor, CssUrlExtractor, DEFAULT_MEDIA_EXTENSIONS, MarkdownImageExtractor,
    QuotedLiteralExtractor, ReferenceExtractor, default_extractors,
};

/// Kind of a media reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceKind {
    /// File inside the scan root.
    Local,
    /// `http://` or `https://` URL.
    Remote,
}

/// A media asset referenced by the project.
#[derive(Debug, Clone)]
pub enum MediaReference {
    /// A file inside the scan root.
    Local {
        /// The spelling found in source text (or the file's own path when
        /// collected directly from the tree).
        raw: String,
        /// Absolute, normalized path of the source file.
        path: PathBuf,
    },
    /// A remote asset addressed by URL.
    Remote {
        /// The literal URL as written.
        url: String,
    },
}

impl MediaReference {
    /// Creates a local reference.
    pub fn local(raw: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Local {
            raw: raw.into(),
            path: path.into(),
        }
    }

    /// Creates a remote reference.
    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote { url: url.into() }
    }

    /// Returns the reference kind.
    #[must_use]
    pub fn kind(&self) -> ReferenceKind {
        match self {
            Self::Local { .. } => ReferenceKind::Local,
            Self::Remote { .. } => ReferenceKind::Remote,
        }
    }

    /// Returns the resolved source path for local references.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Local { path, .. } => Some(path),
            Self::Remote { .. } => None,
        }
    }

    /// Returns the URL for remote references.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Local { .. } => None,
            Self::Remote { url } => Some(url),
        }
    }

    /// Returns the raw text this reference was extracted from.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            Self::Local { raw, .. } => raw,
            Self::Remote { url } => url,
        }
    }

    fn identity(&self) -> (ReferenceKind, &std::ffi::OsStr) {
        match self {
            Self::Local { path, .. } => (ReferenceKind::Local, path.as_os_str()),
            Self::Remote { url } => (ReferenceKind::Remote, std::ffi::OsStr::new(url.as_str())),
        }
    }
}

impl PartialEq for MediaReference {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for MediaReference {}

impl Hash for MediaReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl PartialOrd for MediaReference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MediaReference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

impl fmt::Display for MediaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { path, .. } => write!(f, "{}", path.display()),
            Self::Remote { url } => f.write_str(url),
        }
    }
}

/// Deduplicated set of classified references.
///
/// Remote references iterate in lexicographic URL order; local references in
/// path order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    local: BTreeSet<MediaReference>,
    remote: BTreeSet<MediaReference>,
}

impl ReferenceSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a reference. Returns `false` if an equal reference was present.
    pub fn insert(&mut self, reference: MediaReference) -> bool {
        match reference.kind() {
            ReferenceKind::Local => self.local.insert(reference),
            ReferenceKind::Remote => self.remote.insert(reference),
        }
    }

    /// Local references in path order.
    pub fn local(&self) -> impl Iterator<Item = &MediaReference> {
        self.local.iter()
    }

    /// Remote references in URL order.
    pub fn remote(&self) -> impl Iterator<Item = &MediaReference> {
        self.remote.iter()
    }

    /// All references: locals first, then remotes.
    pub fn iter(&self) -> impl Iterator<Item = &MediaReference> {
        self.local.iter().chain(self.remote.iter())
    }

    /// Number of local references.
    #[must_use]
    pub fn local_len(&self) -> usize {
        self.local.len()
    }

    /// Number of remote references.
    #[must_use]
    pub fn remote_len(&self) -> usize {
        self.remote.len()
    }

    /// Total number of references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.local.len() + self.remote.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.remote.is_empty()
    }

    /// Clones every reference into an ordered list (locals, then remotes).
    #[must_use]
    pub fn to_vec(&self) -> Vec<MediaReference> {
        self.iter().cloned().collect()
    }
}

impl Extend<MediaReference> for ReferenceSet {
    fn extend<I: IntoIterator<Item = MediaReference>>(&mut self, iter: I) {
        for reference in iter {
            self.insert(reference);
        }
    }
}
