//! Keyed-table operations over a single CSV file.
//!
//! A CSV file is treated as a table keyed by its first column. The file's header
//! line is the authoritative column set: [`add_item`] fills every header for each
//! incoming key and drops fields the header does not name.
//!
//! Every read and write goes through a [`FileStore`], so the same operations run
//! against the local filesystem or any other backing. Mutations load the whole
//! file, change the [`KeyedTable`] in memory, and write the result back through
//! [`rewrite`], which first copies the current content to `<path><suffix>` (by
//! default [`DEFAULT_BACKUP_SUFFIX`]).
//!
//! # Example
//!
//! ```no_run
//! use csvsql::io::csv::Dialect;
//! use csvsql::io::fs::LocalFileStore;
//! use csvsql::row::Row;
//! use csvsql::store::{add_item, load_table, LoadOptions, DEFAULT_BACKUP_SUFFIX};
//!
//! let row: Row = [("age", "40")].into_iter().collect();
//! add_item(&LocalFileStore, "people.csv", [("k1", row)], Dialect::default(), Some(DEFAULT_BACKUP_SUFFIX))?;
//!
//! let table = load_table("people.csv", LoadOptions::default())?;
//! println!("{} rows", table.len());
//! # use anyhow::Error; Ok::<(), Error>(())
//! ```
//!
//! # Hazards
//! [`rewrite`] is not transactional. If the process stops between the backup
//! write and the replacement write, recover from the backup file.

use crate::error::{tag, ErrorKind};
use crate::io::csv::{
    read_headers_from_reader, read_rows_from_reader, scan_lines_from_reader, serialize_table,
    to_row, Dialect, RowKeyMode,
};
use crate::io::fs::{FileStore, LocalFileStore};
use crate::row::{KeyedTable, Node, Row};
use anyhow::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Suffix appended to a file's path for its backup copy.
pub const DEFAULT_BACKUP_SUFFIX: &str = ".old";

/// Options for [`load_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Leave the key column out of each row.
    pub strip_key: bool,
    /// Key rows by their 1-based record ordinal instead of the first column.
    pub sequential_index: bool,
    pub dialect: Dialect,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            strip_key: true,
            sequential_index: false,
            dialect: Dialect::default(),
        }
    }
}

impl LoadOptions {
    /// Key on the first column and keep it in each row.
    #[must_use]
    pub fn keep_key() -> Self {
        Self {
            strip_key: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_strip_key(mut self, strip_key: bool) -> Self {
        self.strip_key = strip_key;
        self
    }

    #[must_use]
    pub fn with_sequential_index(mut self, sequential_index: bool) -> Self {
        self.sequential_index = sequential_index;
        self
    }

    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn key_mode(&self) -> RowKeyMode {
        if self.sequential_index {
            RowKeyMode::SequentialIndex
        } else if self.strip_key {
            RowKeyMode::FirstColumnStripped
        } else {
            RowKeyMode::FirstColumnKept
        }
    }
}

/// Load a whole CSV file from the local filesystem into a [`KeyedTable`].
///
/// Rows whose first field is empty (or `"0"`) are left out. When two rows share
/// a key, the later one replaces the earlier.
///
/// # Errors
/// Fails if the file cannot be read or has no header line.
pub fn load_table(path: impl AsRef<Path>, options: LoadOptions) -> Result<KeyedTable> {
    load_table_from(&LocalFileStore, path, options)
}

/// [`load_table`] reading through `store`.
///
/// # Errors
/// Fails with [`ErrorKind::FileUnreadable`] if the store cannot read the file,
/// and with [`ErrorKind::HeaderMissing`] if it has no header line.
pub fn load_table_from<S>(
    store: &S,
    path: impl AsRef<Path>,
    options: LoadOptions,
) -> Result<KeyedTable>
where
    S: FileStore + ?Sized,
{
    let (_, table) = load(store, path.as_ref(), options)?;
    Ok(table)
}

/// Read `path` once through `store` and return its headers and keyed rows.
fn load<S>(
    store: &S,
    path: &Path,
    options: LoadOptions,
) -> Result<(Vec<String>, KeyedTable)>
where
    S: FileStore + ?Sized,
{
    let bytes = store
        .read_all(path)
        .map_err(|e| tag(e, ErrorKind::FileUnreadable, path, "cannot read"))?;
    let headers = read_headers_from_reader(bytes.as_slice(), options.dialect, path)?;
    let stats = scan_lines_from_reader(bytes.as_slice(), path)?;
    let rows = read_rows_from_reader(bytes.as_slice(), options.dialect, stats.longest_line, path)?;
    let mode = options.key_mode();
    let mut table = KeyedTable::new();
    let mut skipped = 0usize;
    for (i, record) in rows.enumerate() {
        let record = record?;
        match to_row(&record, &headers, i + 1, mode) {
            Some((key, row)) => table.insert(key, row),
            None => skipped += 1,
        }
    }
    debug!(
        path = %path.display(),
        rows = table.len(),
        skipped,
        "loaded table"
    );
    Ok((headers, table))
}

/// Create a new CSV file holding only a header line.
///
/// # Errors
/// Fails with [`ErrorKind::ReplaceWriteFailure`] if the file cannot be written.
pub fn create_new<S, H>(
    store: &S,
    path: impl AsRef<Path>,
    headers: &[H],
    dialect: Dialect,
) -> Result<()>
where
    S: FileStore + ?Sized,
    H: AsRef<str>,
{
    let path = path.as_ref();
    let headers: Vec<String> = headers.iter().map(|h| h.as_ref().to_string()).collect();
    let content = serialize_table(&KeyedTable::new(), &headers, dialect.delimiter_char());
    store
        .create(path, content.as_bytes())
        .map_err(|e| tag(e, ErrorKind::ReplaceWriteFailure, path, "cannot create file"))
}

/// Add or replace rows in a CSV file.
///
/// For each incoming key, every column named by the file's header is set to the
/// incoming value, or to an empty string if the incoming row lacks it. Incoming
/// columns the header does not name are dropped.
///
/// The first column is filled like any other. An incoming row without it is
/// written with an empty key and is skipped by the next [`load_table`].
///
/// # Errors
/// Fails if the file cannot be read, has no header, or cannot be rewritten.
pub fn add_item<S, I, K>(
    store: &S,
    path: impl AsRef<Path>,
    items: I,
    dialect: Dialect,
    backup_suffix: Option<&str>,
) -> Result<()>
where
    S: FileStore + ?Sized,
    I: IntoIterator<Item = (K, Row)>,
    K: AsRef<str>,
{
    let path = path.as_ref();
    let options = LoadOptions::keep_key().with_dialect(dialect);
    let (headers, mut table) = load(store, path, options)?;
    let mut added = 0usize;
    for (key, incoming) in items {
        let row = table.entry(key.as_ref());
        fill_from(row, &incoming, &headers);
        added += 1;
    }
    let content = serialize_table(&table, &headers, dialect.delimiter_char());
    rewrite(store, path, content.as_bytes(), backup_suffix)?;
    info!(path = %path.display(), added, "items written");
    Ok(())
}

fn fill_from(row: &mut Row, incoming: &Row, headers: &[String]) {
    for header in headers {
        let value = incoming
            .get(header)
            .cloned()
            .unwrap_or_else(|| Node::Leaf(String::new()));
        row.insert(header.as_str(), value);
    }
}

/// Remove rows from a CSV file by key. Keys that are not present are ignored.
///
/// # Errors
/// Fails if the file cannot be read, has no header, or cannot be rewritten.
pub fn delete_data<S, I, K>(
    store: &S,
    path: impl AsRef<Path>,
    keys: I,
    dialect: Dialect,
    backup_suffix: Option<&str>,
) -> Result<()>
where
    S: FileStore + ?Sized,
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    let path = path.as_ref();
    let options = LoadOptions::keep_key().with_dialect(dialect);
    let (headers, mut table) = load(store, path, options)?;
    let removed = keys
        .into_iter()
        .filter(|key| table.remove(key.as_ref()).is_some())
        .count();
    let content = serialize_table(&table, &headers, dialect.delimiter_char());
    rewrite(store, path, content.as_bytes(), backup_suffix)?;
    info!(path = %path.display(), removed, "items deleted");
    Ok(())
}

/// Path of the backup copy for `path` under `suffix`.
#[must_use]
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

/// Replace the content of `path`, first saving the current content to
/// `<path><suffix>` when a non-empty suffix is given.
///
/// If the backup cannot be written, the original file is left untouched.
///
/// # Errors
/// Fails with [`ErrorKind::FileUnreadable`] if the current content cannot be read,
/// [`ErrorKind::BackupWriteFailure`] if the backup cannot be written, and
/// [`ErrorKind::ReplaceWriteFailure`] if the new content cannot be written.
pub fn rewrite<S>(
    store: &S,
    path: impl AsRef<Path>,
    content: &[u8],
    backup_suffix: Option<&str>,
) -> Result<()>
where
    S: FileStore + ?Sized,
{
    let path = path.as_ref();
    if let Some(suffix) = backup_suffix.filter(|s| !s.is_empty()) {
        let old = store
            .read_all(path)
            .map_err(|e| tag(e, ErrorKind::FileUnreadable, path, "cannot read for backup"))?;
        let backup = backup_path(path, suffix);
        store
            .create(&backup, &old)
            .map_err(|e| tag(e, ErrorKind::BackupWriteFailure, &backup, "cannot write backup"))?;
        debug!(backup = %backup.display(), bytes = old.len(), "backup written");
    }
    store
        .create(path, content)
        .map_err(|e| tag(e, ErrorKind::ReplaceWriteFailure, path, "cannot write file"))?;
    Ok(())
}
