//! Partition a directory of CSV files into groupings and check header consistency.
//!
//! A grouping is the set of files whose bare filename yields the same value for
//! capture group 1 of a pattern such as `([a-z]{3})[0-9]{2}\.csv`. All files of a
//! grouping load into one table, so they must share one header layout exactly,
//! names and order included.
//!
//! Any file that does not match the pattern, cannot be read, or breaks its
//! grouping's layout fails the whole discovery; nothing is returned for the
//! other files.

use crate::error::{raise, tag, ErrorKind};
use crate::io::csv::{read_headers, scan_lines, Dialect};
use crate::io::fs::DirectoryLister;
use anyhow::Result;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What discovery learned about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Bare filename.
    pub name: String,
    pub path: PathBuf,
    /// Value of the pattern's capture group.
    pub grouping: String,
    pub headers: Vec<String>,
    /// Number of lines ending in `\r\n`.
    pub crlf_count: usize,
    /// Longest physical line in bytes, used to size the row reader.
    pub longest_line: usize,
}

impl FileInfo {
    /// Whether the bulk load for this file should use `\r\n` line terminators.
    /// Any CRLF occurrence at all selects CRLF.
    #[must_use]
    pub fn uses_crlf(&self) -> bool {
        self.crlf_count > 0
    }
}

/// Files sharing one grouping id, in filename order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping {
    pub id: String,
    /// Header layout shared by every file.
    pub headers: Vec<String>,
    pub files: Vec<FileInfo>,
}

/// Bucket `items` by `key`, keeping the relative order of items within a bucket.
pub fn regroup_by<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> BTreeMap<K, Vec<T>>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut out: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        out.entry(key(&item)).or_default().push(item);
    }
    out
}

/// Compile a grouping pattern, requiring exactly one capture group.
///
/// # Errors
/// Fails with [`ErrorKind::InvalidPattern`] if the pattern does not compile or
/// does not have exactly one capture group.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    let re = Regex::new(pattern).map_err(|e| {
        anyhow::Error::new(e).context(crate::error::Error::new(
            ErrorKind::InvalidPattern,
            format!("cannot compile grouping pattern {pattern:?}"),
        ))
    })?;
    // captures_len counts the implicit whole-match group
    if re.captures_len() != 2 {
        return Err(anyhow::Error::new(crate::error::Error::new(
            ErrorKind::InvalidPattern,
            format!(
                "grouping pattern {pattern:?} must have exactly one capture group, found {}",
                re.captures_len() - 1
            ),
        )));
    }
    Ok(re)
}

/// The grouping id of a bare filename, if the pattern matches it.
#[must_use]
pub fn grouping_id(pattern: &Regex, name: &str) -> Option<String> {
    pattern
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Read the header and line statistics of one file assigned to `grouping`.
///
/// # Errors
/// Fails if the file cannot be read or has no header line.
pub fn inspect_file(
    path: &Path,
    name: &str,
    grouping: &str,
    dialect: Dialect,
) -> Result<FileInfo> {
    let headers = read_headers(path, dialect)?;
    let stats = scan_lines(path)?;
    debug!(
        file = name,
        grouping,
        columns = headers.len(),
        crlf = stats.crlf_count,
        "inspected file"
    );
    Ok(FileInfo {
        name: name.to_string(),
        path: path.to_path_buf(),
        grouping: grouping.to_string(),
        headers,
        crlf_count: stats.crlf_count,
        longest_line: stats.longest_line,
    })
}

/// Check that every file in `files` has the same headers as the first one.
///
/// The first file is the reference. If it is the odd one out, the file named is
/// the second one.
///
/// # Errors
/// Fails with [`ErrorKind::HeaderInconsistency`] naming the first file that
/// differs from the grouping's first file.
pub fn check_consistency(id: &str, files: &[FileInfo]) -> Result<()> {
    let Some(first) = files.first() else {
        return Ok(());
    };
    if let Some(bad) = files.iter().find(|f| f.headers != first.headers) {
        return Err(raise(
            ErrorKind::HeaderInconsistency,
            &bad.path,
            format!(
                "headers of {} in grouping {id:?} differ from those of {}",
                bad.name, first.name
            ),
        ));
    }
    Ok(())
}

/// List `dir`, assign each file to a grouping, and validate every grouping.
///
/// Groupings are returned in ascending id order.
///
/// # Errors
/// Fails if the directory cannot be listed, a filename does not match
/// `pattern`, a file cannot be read or has no header, or a grouping's files
/// disagree on headers.
pub fn discover<L>(
    lister: &L,
    dir: &Path,
    pattern: &Regex,
    extensions: &[&str],
    dialect: Dialect,
) -> Result<Vec<Grouping>>
where
    L: DirectoryLister + ?Sized,
{
    if pattern.captures_len() != 2 {
        return Err(raise(
            ErrorKind::InvalidPattern,
            dir,
            format!("grouping pattern {:?} must have exactly one capture group", pattern.as_str()),
        ));
    }
    let listing = lister
        .list(dir, extensions)
        .map_err(|e| tag(e, ErrorKind::FileUnreadable, dir, "cannot list directory"))?;

    let mut files = Vec::with_capacity(listing.len());
    for (name, entry) in &listing {
        let Some(id) = grouping_id(pattern, name) else {
            return Err(raise(
                ErrorKind::PatternMismatch,
                &entry.path,
                format!("{name} does not match grouping pattern {:?}", pattern.as_str()),
            ));
        };
        files.push(inspect_file(&entry.path, name, &id, dialect)?);
    }

    let mut groupings = Vec::new();
    for (id, files) in regroup_by(files, |f| f.grouping.clone()) {
        check_consistency(&id, &files)?;
        let headers = files[0].headers.clone();
        groupings.push(Grouping { id, headers, files });
    }
    Ok(groupings)
}
