//! # csvsql
//!
//! Read and rewrite CSV files as keyed tables, and turn a directory of related
//! CSV files into a MySQL script that creates matching tables and bulk-loads them.
//!
//! ## Key Features
//!
//! - **CSV codec** - streaming header and row reads, escaping writes, nested-row flattening
//! - **Keyed tables** - load a file keyed by its first column, add or replace rows, delete rows
//! - **Backups** - every rewrite first copies the old content to `<file>.old`
//! - **Groupings** - partition files by a filename pattern and require identical headers
//! - **Schema inference** - one streaming pass per file widens each column's type and length
//! - **SQL generation** - `CREATE TABLE` plus `LOAD DATA LOCAL INFILE` per file, CRLF-aware
//!
//! ## Quick Start
//!
//! ```no_run
//! use csvsql::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! // Keyed table operations
//! let mut row = Row::new();
//! row.insert("name", "Dave");
//! row.insert("age", "35");
//! add_item(&LocalFileStore, "people.csv", [("p4", row)], Dialect::default(), Some(DEFAULT_BACKUP_SUFFIX))?;
//! let table = load_table("people.csv", LoadOptions::default())?;
//! println!("{} rows", table.len());
//!
//! // Directory import
//! let options = SqlOptions::default().with_display_name("abc", "Alphabet codes");
//! let script = generate_sql_for_dir("data/", r"([a-z]{3})[0-9]{2}\.csv", &options)?;
//! print!("{script}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Data flow
//!
//! 1. [`grouping`] lists the directory, assigns each file a grouping id from the
//!    pattern's capture group, and checks that each grouping agrees on headers
//! 2. [`schema`] streams every row of every file once per grouping
//! 3. [`sql`] renders the script
//!
//! Any structural failure stops the import with an [`Error`] whose
//! [`ErrorKind`] names the problem; no partial script is produced.
//!
//! ## Module Overview
//!
//! - [`io`] - the CSV codec and the file-store / directory-lister seams
//! - [`row`] - `Row`, `Node`, and `KeyedTable`
//! - [`store`] - load, add, delete, and rewrite-with-backup on one file
//! - [`grouping`] - file grouping and header consistency
//! - [`schema`] - type and length inference
//! - [`sql`] - script rendering and its options
//! - [`import`] - the end-to-end directory import
//! - [`testing`] - temporary directories, fixtures, and mock stores

pub mod error;
pub mod grouping;
pub mod import;
pub mod io;
pub mod row;
pub mod schema;
pub mod sql;
pub mod store;
pub mod testing;

// General re-exports
pub use error::{Error, ErrorKind};
pub use grouping::{FileInfo, Grouping};
pub use import::{generate_sql, generate_sql_for_dir, infer_dir};
pub use io::csv::{Dialect, RowKeyMode};
pub use io::fs::{DirectoryLister, FileStore, GlobLister, LocalFileStore};
pub use row::{KeyedTable, Node, Row};
pub use schema::{ColumnSchema, ColumnType, InferredTable, TableSchema};
pub use sql::SqlOptions;
pub use store::{
    add_item, create_new, delete_data, load_table, load_table_from, rewrite, LoadOptions,
    DEFAULT_BACKUP_SUFFIX,
};
