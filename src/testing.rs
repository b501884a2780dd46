//! Testing utilities for code built on csvsql.
//!
//! This module provides:
//!
//! - **Mock I/O**: temporary directories, fixture files, and an in-memory
//!   [`FileStore`](crate::io::fs::FileStore) that can be told to fail
//! - **Fixtures**: small CSV documents covering the cases the codec and the
//!   importer care about (quoting, CRLF endings, short rows, missing keys)
//!
//! # Quick Start
//!
//! ```no_run
//! use csvsql::store::{load_table, LoadOptions};
//! use csvsql::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = TempDirPath::new()?;
//! let path = dir.write("people.csv", PEOPLE_CSV)?;
//! let table = load_table(&path, LoadOptions::keep_key())?;
//! assert_eq!(table.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod mock_io;

pub use fixtures::*;
pub use mock_io::*;
