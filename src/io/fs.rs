//! File and directory collaborators used at the edges of the crate.
//!
//! Two seams keep the core free of direct filesystem policy:
//!
//! - [`FileStore`] creates and reads whole files. [`LocalFileStore`] writes through
//!   a temporary sibling file and renames it over the target, so a reader never
//!   sees a half-written file.
//! - [`DirectoryLister`] lists the files of a directory by extension.
//!   [`GlobLister`] expands one `dir/*.ext` glob per extension.
//!
//! # Examples
//!
//! ```no_run
//! use csvsql::io::fs::{DirectoryLister, GlobLister};
//!
//! let files = GlobLister.list("data/".as_ref(), &["csv"])?;
//! for (name, entry) in &files {
//!     println!("{name}: {} bytes", entry.size);
//! }
//! # use anyhow::Error; Ok::<(), Error>(())
//! ```

use anyhow::{Context, Result};
use glob::{glob_with, MatchOptions, Pattern};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Whole-file read and create operations.
pub trait FileStore {
    /// Create or replace `path` with `content`.
    ///
    /// # Errors
    /// Returns an error if the content could not be fully written.
    fn create(&self, path: &Path, content: &[u8]) -> Result<()>;

    /// Read the full content of `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    fn read_all(&self, path: &Path) -> Result<Vec<u8>>;
}

/// [`FileStore`] over the local filesystem with write-then-rename replacement.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

impl FileStore for LocalFileStore {
    fn create(&self, path: &Path, content: &[u8]) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("create temporary file in {}", dir.display()))?;
        tmp.write_all(content)
            .with_context(|| format!("write {}", tmp.path().display()))?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("sync {}", tmp.path().display()))?;
        tmp.persist(path)
            .with_context(|| format!("replace {}", path.display()))?;
        Ok(())
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("read {}", path.display()))
    }
}

/// Metadata for one listed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
}

/// Directory listing filtered by file extension.
pub trait DirectoryLister {
    /// List regular files directly inside `dir` whose extension is one of
    /// `extensions` (without the dot), keyed by bare filename.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read.
    fn list(&self, dir: &Path, extensions: &[&str]) -> Result<BTreeMap<String, FileEntry>>;
}

/// [`DirectoryLister`] built on `glob` patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobLister;

impl DirectoryLister for GlobLister {
    fn list(&self, dir: &Path, extensions: &[&str]) -> Result<BTreeMap<String, FileEntry>> {
        let meta = fs::metadata(dir).with_context(|| format!("read directory {}", dir.display()))?;
        if !meta.is_dir() {
            anyhow::bail!("not a directory: {}", dir.display());
        }
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };
        let base = Pattern::escape(&dir.to_string_lossy());
        let mut out = BTreeMap::new();
        for ext in extensions {
            let pattern = format!("{base}/*.{}", Pattern::escape(ext));
            let paths = glob_with(&pattern, options)
                .with_context(|| format!("invalid glob pattern: {pattern}"))?;
            for entry in paths {
                let path = entry
                    .with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
                // Only include actual files, not directories
                if !path.is_file() {
                    continue;
                }
                let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                    continue;
                };
                let size = fs::metadata(&path)
                    .with_context(|| format!("stat {}", path.display()))?
                    .len();
                out.insert(name, FileEntry { path, size });
            }
        }
        Ok(out)
    }
}
