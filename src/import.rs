//! End-to-end directory import: group files, infer schemas, render SQL.
//!
//! ```no_run
//! use csvsql::import::generate_sql_for_dir;
//! use csvsql::sql::SqlOptions;
//!
//! let options = SqlOptions::default().with_display_name("abc", "alphabet");
//! let script = generate_sql_for_dir("data/", r"([a-z]{3})[0-9]{2}\.csv", &options)?;
//! println!("{script}");
//! # use anyhow::Error; Ok::<(), Error>(())
//! ```
//!
//! Every file is read twice: once as raw bytes for line statistics and once as
//! CSV records for inference. Expect this to be slow on large file sets.

use crate::grouping::{compile_pattern, discover};
use crate::io::fs::{DirectoryLister, GlobLister};
use crate::schema::{infer_schema, InferredTable};
use crate::sql::{check_columns, render_script, SqlOptions};
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Discover the groupings of `dir` and infer a schema for each.
///
/// # Errors
/// Fails on an invalid pattern, an unreadable directory or file, a filename that
/// does not match `pattern`, a grouping with inconsistent headers, or a header
/// that clashes with the generated `id` key.
pub fn infer_dir<L>(
    lister: &L,
    dir: impl AsRef<Path>,
    pattern: &str,
    options: &SqlOptions,
) -> Result<Vec<InferredTable>>
where
    L: DirectoryLister + ?Sized,
{
    let dir = dir.as_ref();
    let pattern = compile_pattern(pattern)?;
    let extensions: Vec<&str> = options.extensions.iter().map(String::as_str).collect();
    let groupings = discover(lister, dir, &pattern, &extensions, options.dialect)?;
    info!(
        dir = %dir.display(),
        groupings = groupings.len(),
        "discovered groupings"
    );
    for grouping in &groupings {
        check_columns(grouping)?;
    }
    groupings
        .into_iter()
        .map(|grouping| -> Result<InferredTable> {
            let schema = infer_schema(&grouping, options.dialect)?;
            Ok(InferredTable { grouping, schema })
        })
        .collect()
}

/// Run the whole import and return the SQL script.
///
/// Nothing is returned on failure; there is no partial script.
///
/// # Errors
/// See [`infer_dir`].
pub fn generate_sql<L>(
    lister: &L,
    dir: impl AsRef<Path>,
    pattern: &str,
    options: &SqlOptions,
) -> Result<String>
where
    L: DirectoryLister + ?Sized,
{
    let tables = infer_dir(lister, dir, pattern, options)?;
    render_script(&tables, options)
}

/// [`generate_sql`] over the local filesystem.
///
/// # Errors
/// See [`infer_dir`].
pub fn generate_sql_for_dir(
    dir: impl AsRef<Path>,
    pattern: &str,
    options: &SqlOptions,
) -> Result<String> {
    generate_sql(&GlobLister, dir, pattern, options)
}
