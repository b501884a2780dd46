//! Column type and length inference over every data row of a grouping.
//!
//! Each column starts as `INT` of length 1 and only ever widens:
//! - the length becomes the largest byte length seen in that column;
//! - the type becomes variable text the first time a value is not made solely
//!   of ASCII digits, and never goes back.
//!
//! Inference streams each file once and never materializes a table, so memory
//! stays flat while run time is linear in the total number of cells. On large
//! file sets this pass dominates the import.

use crate::grouping::Grouping;
use crate::io::csv::{is_missing_key, read_rows_with_capacity, Dialect};
use anyhow::Result;
use csv::ByteRecord;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    VariableText,
}

/// Inferred type and maximum byte length of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSchema {
    pub column_type: ColumnType,
    pub length: usize,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            column_type: ColumnType::Integer,
            length: 1,
        }
    }
}

impl ColumnSchema {
    /// Widen this estimate to admit `value`.
    pub fn observe(&mut self, value: &[u8]) {
        self.length = self.length.max(value.len());
        if self.column_type == ColumnType::Integer && !is_all_digits(value) {
            self.column_type = ColumnType::VariableText;
        }
    }
}

/// True for a non-empty value made solely of ASCII digits.
#[must_use]
pub fn is_all_digits(value: &[u8]) -> bool {
    !value.is_empty() && value.iter().all(u8::is_ascii_digit)
}

/// Column estimates for one table, in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<(String, ColumnSchema)>,
}

impl TableSchema {
    /// Seed every header with the narrowest estimate.
    #[must_use]
    pub fn new(headers: &[String]) -> Self {
        Self {
            columns: headers
                .iter()
                .map(|h| (h.clone(), ColumnSchema::default()))
                .collect(),
        }
    }

    /// Widen columns with one data record, matched by position.
    ///
    /// Records with a missing key are ignored, as are fields past the last header.
    /// Returns whether the record was used.
    pub fn observe_record(&mut self, record: &ByteRecord) -> bool {
        match record.get(0) {
            Some(key) if !is_missing_key(key) => {}
            _ => return false,
        }
        for (field, (_, column)) in record.iter().zip(self.columns.iter_mut()) {
            column.observe(field);
        }
        true
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|(c, _)| c == column).map(|(_, s)| s)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnSchema)> {
        self.columns.iter().map(|(c, s)| (c.as_str(), s))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A grouping together with its inferred schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredTable {
    pub grouping: Grouping,
    pub schema: TableSchema,
}

/// Stream every data row of every file in `grouping` once and infer its schema.
///
/// # Errors
/// Fails if any file cannot be read.
pub fn infer_schema(grouping: &Grouping, dialect: Dialect) -> Result<TableSchema> {
    let mut schema = TableSchema::new(&grouping.headers);
    for file in &grouping.files {
        let mut used = 0usize;
        let mut skipped = 0usize;
        for record in read_rows_with_capacity(&file.path, dialect, file.longest_line)? {
            if schema.observe_record(&record?) {
                used += 1;
            } else {
                skipped += 1;
            }
        }
        debug!(file = %file.name, rows = used, skipped, "scanned file");
    }
    info!(grouping = %grouping.id, files = grouping.files.len(), "inferred schema");
    Ok(schema)
}
