//! Mock I/O helpers for testing against temporary files or memory.
//!
//! - [`TempDirPath`]: a temporary directory removed on drop, with helpers to
//!   write fixture files into it
//! - [`MemoryFileStore`]: a [`FileStore`] that keeps files in memory
//! - [`FaultyFileStore`]: a [`FileStore`] over the local filesystem that fails
//!   writes to chosen paths

use crate::io::fs::{FileStore, LocalFileStore};
use anyhow::{bail, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory that is automatically deleted when dropped.
pub struct TempDirPath {
    #[allow(dead_code)]
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempDirPath {
    /// Create a new temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self { temp_dir, path })
    }

    /// Get the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a file path within this directory.
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }

    /// Write `content` to `filename` inside this directory and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, filename: &str, content: impl AsRef<[u8]>) -> std::io::Result<PathBuf> {
        let path = self.file_path(filename);
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

impl Default for TempDirPath {
    fn default() -> Self {
        Self::new().expect("Failed to create temporary directory")
    }
}

/// An in-memory [`FileStore`].
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryFileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.files.borrow_mut().insert(path.into(), content.into());
    }

    /// Content of a file, if present.
    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.borrow().get(path.as_ref()).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

impl FileStore for MemoryFileStore {
    fn create(&self, path: &Path, content: &[u8]) -> Result<()> {
        self.insert(path, content);
        Ok(())
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        match self.get(path) {
            Some(content) => Ok(content),
            None => bail!("no such file: {}", path.display()),
        }
    }
}

/// A local [`FileStore`] that refuses to write selected paths.
#[derive(Debug, Default)]
pub struct FaultyFileStore {
    failing: BTreeSet<PathBuf>,
    writes: RefCell<Vec<PathBuf>>,
}

impl FaultyFileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `path` fail.
    #[must_use]
    pub fn fail_writes_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing.insert(path.into());
        self
    }

    /// Paths written successfully, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.borrow().clone()
    }
}

impl FileStore for FaultyFileStore {
    fn create(&self, path: &Path, content: &[u8]) -> Result<()> {
        if self.failing.contains(path) {
            bail!("injected write failure: {}", path.display());
        }
        LocalFileStore.create(path, content)?;
        self.writes.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        LocalFileStore.read_all(path)
    }
}
