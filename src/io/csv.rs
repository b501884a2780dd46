//! CSV codec: header discovery, streaming row reads, and escaping writes.
//!
//! This module provides:
//! - **Header discovery**: [`read_headers`] parses only the first record
//! - **Streaming rows**: [`read_rows`] yields the raw fields of every data record
//! - **Row keys**: [`to_row`] turns raw fields into a keyed [`Row`] under a [`RowKeyMode`]
//! - **Writing**: [`serialize_cell`], [`serialize_row`], [`serialize_table`]
//! - **Raw scan**: [`scan_lines`] measures the longest line and counts CRLF endings
//!
//! The path-based readers open the file themselves. The `*_from_reader` variants
//! parse any [`Read`] source, such as bytes fetched through a
//! [`FileStore`](crate::io::fs::FileStore); their `path` argument only labels errors.
//!
//! # Design notes
//! - The dialect is fixed apart from the delimiter: `"` encloses, `""` escapes a
//!   literal quote, and CRLF or LF both end a record.
//! - Reads are flexible: a record with fewer fields than the header is not padded,
//!   its missing columns are simply absent from the resulting [`Row`].
//! - A data record whose first field is empty or `"0"` never becomes a row.
//! - Fields are decoded as UTF-8, falling back to Latin-1 for invalid byte sequences.

use crate::error::{raise, raise_from, ErrorKind};
use crate::row::{KeyedTable, Node, Row};
use anyhow::Result;
use csv::{ByteRecord, Reader, ReaderBuilder};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Delimiter choice for reading and writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
}

impl Dialect {
    #[must_use]
    pub const fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// The delimiter as a `char`, for writing.
    #[must_use]
    pub fn delimiter_char(&self) -> char {
        char::from(self.delimiter)
    }

    fn reader<R: Read>(&self, rdr: R, capacity: usize) -> Reader<R> {
        ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(b'"')
            .double_quote(true)
            .buffer_capacity(capacity.max(1))
            .from_reader(rdr)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::new(b',')
    }
}

/// How [`to_row`] chooses a row key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKeyMode {
    /// Key on the first field and leave that column out of the row.
    FirstColumnStripped,
    /// Key on the first field and keep it in the row.
    FirstColumnKept,
    /// Key on the 1-based ordinal of the data record.
    SequentialIndex,
}

/// Result of a raw byte pass over a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStats {
    /// Length in bytes of the longest physical line, terminator included.
    pub longest_line: usize,
    /// Number of lines ending in `\r\n`.
    pub crlf_count: usize,
}

/// Scan the raw bytes of `path` once, line by line.
///
/// # Errors
/// Fails with [`ErrorKind::FileUnreadable`] if the file cannot be opened or read.
pub fn scan_lines(path: impl AsRef<Path>) -> Result<LineStats> {
    let path = path.as_ref();
    scan_lines_from_reader(BufReader::new(open(path)?), path)
}

/// [`scan_lines`] over an already open source.
///
/// # Errors
/// Fails with [`ErrorKind::FileUnreadable`] if reading fails.
pub fn scan_lines_from_reader<R: BufRead>(mut rdr: R, path: &Path) -> Result<LineStats> {
    let mut stats = LineStats::default();
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = rdr
            .read_until(b'\n', &mut line)
            .map_err(|e| raise_from(e, ErrorKind::FileUnreadable, path, "read failed"))?;
        if n == 0 {
            break;
        }
        stats.longest_line = stats.longest_line.max(n);
        if line.ends_with(b"\r\n") {
            stats.crlf_count += 1;
        }
    }
    Ok(stats)
}

/// Read the header record (the first line) of `path`.
///
/// # Errors
/// Fails with [`ErrorKind::FileUnreadable`] if the file cannot be read, and with
/// [`ErrorKind::HeaderMissing`] if the file is empty or its first line is blank.
pub fn read_headers(path: impl AsRef<Path>, dialect: Dialect) -> Result<Vec<String>> {
    let path = path.as_ref();
    read_headers_from_reader(open(path)?, dialect, path)
}

/// [`read_headers`] over an already open source.
///
/// # Errors
/// Same as [`read_headers`].
pub fn read_headers_from_reader<R: Read>(
    rdr: R,
    dialect: Dialect,
    path: &Path,
) -> Result<Vec<String>> {
    let mut buffered = BufReader::new(rdr);
    // The record reader skips blank lines, so an empty first line is caught here.
    let head = buffered
        .fill_buf()
        .map_err(|e| raise_from(e, ErrorKind::FileUnreadable, path, "read failed"))?;
    if matches!(head.first(), None | Some(b'\n' | b'\r')) {
        return Err(raise(ErrorKind::HeaderMissing, path, "first line is empty"));
    }
    let mut rdr = dialect.reader(buffered, 8 * 1024);
    let mut record = ByteRecord::new();
    let found = rdr
        .read_byte_record(&mut record)
        .map_err(|e| raise_from(e, ErrorKind::FileUnreadable, path, "read failed"))?;
    if !found {
        return Err(raise(ErrorKind::HeaderMissing, path, "no header record"));
    }
    Ok(record.iter().map(decode_field).collect())
}

/// Lazy sequence of raw data records, header line excluded.
///
/// Created by [`read_rows`]. Each item is the record's fields in file order.
pub struct RawRows<R = File> {
    reader: Reader<R>,
    path: PathBuf,
    failed: bool,
}

impl<R: Read> Iterator for RawRows<R> {
    type Item = Result<ByteRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let mut record = ByteRecord::new();
        match self.reader.read_byte_record(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(raise_from(
                    e,
                    ErrorKind::FileUnreadable,
                    &self.path,
                    "read failed",
                )))
            }
        }
    }
}

/// Open `path` for streaming its data records.
///
/// A first pass over the raw bytes sizes the reader's buffer to the longest line.
///
/// # Errors
/// Fails with [`ErrorKind::FileUnreadable`] if the file cannot be opened or read.
pub fn read_rows(path: impl AsRef<Path>, dialect: Dialect) -> Result<RawRows> {
    let path = path.as_ref();
    let stats = scan_lines(path)?;
    read_rows_with_capacity(path, dialect, stats.longest_line)
}

/// Like [`read_rows`] with a caller-supplied buffer size, skipping the sizing pass.
///
/// # Errors
/// Fails with [`ErrorKind::FileUnreadable`] if the file cannot be opened or read.
pub fn read_rows_with_capacity(
    path: impl AsRef<Path>,
    dialect: Dialect,
    capacity: usize,
) -> Result<RawRows> {
    let path = path.as_ref();
    read_rows_from_reader(open(path)?, dialect, capacity, path)
}

/// Stream the data records of an already open source, skipping its header line.
///
/// # Errors
/// Fails with [`ErrorKind::FileUnreadable`] if the header line cannot be read.
pub fn read_rows_from_reader<R: Read>(
    rdr: R,
    dialect: Dialect,
    capacity: usize,
    path: &Path,
) -> Result<RawRows<R>> {
    let mut reader = dialect.reader(rdr, capacity);
    // skip header
    let mut header = ByteRecord::new();
    reader
        .read_byte_record(&mut header)
        .map_err(|e| raise_from(e, ErrorKind::FileUnreadable, path, "read failed"))?;
    Ok(RawRows {
        reader,
        path: path.to_path_buf(),
        failed: false,
    })
}

/// Whether a row key counts as missing: empty, or the single digit `0`.
#[must_use]
pub fn is_missing_key(key: &[u8]) -> bool {
    key.is_empty() || key == b"0"
}

/// Turn raw fields into `(row_key, row)`.
///
/// `ordinal` is the 1-based position of the record among data records and is
/// only used as the key in [`RowKeyMode::SequentialIndex`]. Fields are assigned
/// to the header at the same position; fields past the last header are dropped
/// and absent trailing fields stay absent.
///
/// Returns `None` when the first field is a missing key (see [`is_missing_key`]).
#[must_use]
pub fn to_row(
    fields: &ByteRecord,
    headers: &[String],
    ordinal: usize,
    mode: RowKeyMode,
) -> Option<(String, Row)> {
    let first = fields.get(0)?;
    if is_missing_key(first) {
        return None;
    }
    let key = match mode {
        RowKeyMode::SequentialIndex => ordinal.to_string(),
        RowKeyMode::FirstColumnStripped | RowKeyMode::FirstColumnKept => decode_field(first),
    };
    let skip = usize::from(mode == RowKeyMode::FirstColumnStripped);
    let mut row = Row::new();
    for (i, field) in fields.iter().enumerate().skip(skip) {
        if let Some(header) = headers.get(i) {
            row.insert(header.as_str(), decode_field(field));
        }
    }
    Some((key, row))
}

/// Decode one field as UTF-8, or as Latin-1 if it is not valid UTF-8.
#[must_use]
pub fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Make a single value safe to place in a CSV line.
///
/// Quotes are doubled and carriage returns removed; the result is enclosed in
/// quotes if it contains the delimiter, a newline, or a quote.
///
/// ```
/// use csvsql::io::csv::serialize_cell;
///
/// assert_eq!(serialize_cell("He said \"hi\"\r\n", ','), "\"He said \"\"hi\"\"\n\"");
/// assert_eq!(serialize_cell("plain", ','), "plain");
/// ```
#[must_use]
pub fn serialize_cell(value: &str, delimiter: char) -> String {
    let cell = value.replace('"', "\"\"").replace('\r', "");
    if cell.contains(delimiter) || cell.contains('\n') || cell.contains('"') {
        format!("\"{cell}\"")
    } else {
        cell
    }
}

/// Serialize a row into a `(header_line, data_line)` pair, each ending in `\n`.
///
/// Nested rows are flattened in place: a child column `c` under parent column
/// `p` becomes the column `"p: c"`.
#[must_use]
pub fn serialize_row(row: &Row, delimiter: char) -> (String, String) {
    flatten(row, delimiter, None)
}

fn flatten(row: &Row, delimiter: char, parent: Option<&str>) -> (String, String) {
    let mut headers = Vec::with_capacity(row.len());
    let mut data = Vec::with_capacity(row.len());
    for (column, node) in row.iter() {
        match node {
            Node::Nested(child) => {
                let (h, d) = flatten(child, delimiter, Some(column));
                headers.push(h);
                data.push(d);
            }
            Node::Leaf(value) => {
                let name = match parent {
                    Some(p) => format!("{p}: {column}"),
                    None => column.to_string(),
                };
                headers.push(serialize_cell(&name, delimiter));
                data.push(serialize_cell(value, delimiter));
            }
        }
    }
    let sep = delimiter.to_string();
    let mut header_line = headers.join(&sep);
    let mut data_line = data.join(&sep);
    // Only the outermost call owns the line break.
    if parent.is_none() {
        header_line.push('\n');
        data_line.push('\n');
    }
    (header_line, data_line)
}

/// Serialize a whole table: the header line, then one line per row in table order.
///
/// An empty table still produces its header line.
#[must_use]
pub fn serialize_table(table: &KeyedTable, headers: &[String], delimiter: char) -> String {
    let mut out: String = headers
        .iter()
        .map(|h| serialize_cell(h, delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string());
    out.push('\n');
    for (_, row) in table.iter() {
        let (_, line) = serialize_row(row, delimiter);
        out.push_str(&line);
    }
    out
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| raise_from(e, ErrorKind::FileUnreadable, path, "cannot open"))
}
