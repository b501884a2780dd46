//! Structural error kinds raised by the codec, the store, and the import pipeline.
//!
//! Every public operation returns [`anyhow::Result`]. Failures that callers may
//! want to branch on are raised as an [`Error`] value inside the `anyhow` chain,
//! so the kind can be recovered with [`kind_of`] or `downcast_ref::<Error>()`.
//!
//! ```
//! use csvsql::error::{kind_of, Error, ErrorKind};
//!
//! let err = anyhow::Error::new(Error::new(ErrorKind::HeaderMissing, "empty first line"));
//! assert_eq!(kind_of(&err), Some(ErrorKind::HeaderMissing));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

/// Category of a structural failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A file could not be opened or read.
    FileUnreadable,
    /// The first record of a file is absent or unparsable.
    HeaderMissing,
    /// A filename does not match the grouping pattern.
    PatternMismatch,
    /// Two files in one grouping disagree on their header layout.
    HeaderInconsistency,
    /// The grouping pattern does not have exactly one capture group.
    InvalidPattern,
    /// A header collides with the synthetic primary key column of the generated table.
    ReservedColumn,
    /// Writing the backup copy before a rewrite failed.
    BackupWriteFailure,
    /// Writing the replacement content failed.
    ReplaceWriteFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FileUnreadable => "file unreadable",
            Self::HeaderMissing => "header missing",
            Self::PatternMismatch => "pattern mismatch",
            Self::HeaderInconsistency => "header inconsistency",
            Self::InvalidPattern => "invalid pattern",
            Self::ReservedColumn => "reserved column",
            Self::BackupWriteFailure => "backup write failure",
            Self::ReplaceWriteFailure => "replace write failure",
        };
        f.write_str(s)
    }
}

/// A structural failure with the offending file, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    path: Option<PathBuf>,
}

impl Error {
    /// Create an error with a message and no path.
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
        }
    }

    /// Attach the path of the file the error concerns.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(ref path) = self.path {
            write!(f, " ({})", path.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

/// Find the [`Error`] in an `anyhow` chain, whether it is the root cause or
/// attached as context, and return its kind.
#[must_use]
pub fn kind_of(err: &anyhow::Error) -> Option<ErrorKind> {
    err.downcast_ref::<Error>()
        .or_else(|| err.chain().find_map(|cause| cause.downcast_ref::<Error>()))
        .map(Error::kind)
}

/// Build an `anyhow` error carrying a structural [`Error`] for `path`.
pub(crate) fn raise(kind: ErrorKind, path: &Path, message: impl Into<String>) -> anyhow::Error {
    anyhow::Error::new(Error::new(kind, message).with_path(path))
}

/// Like [`raise`], keeping `source` as the underlying cause.
pub(crate) fn raise_from<E>(
    source: E,
    kind: ErrorKind,
    path: &Path,
    message: impl Into<String>,
) -> anyhow::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    anyhow::Error::new(source).context(Error::new(kind, message).with_path(path))
}

/// Wrap an existing `anyhow` error with a structural [`Error`] for `path`.
pub(crate) fn tag(
    err: anyhow::Error,
    kind: ErrorKind,
    path: &Path,
    message: impl Into<String>,
) -> anyhow::Error {
    err.context(Error::new(kind, message).with_path(path))
}
