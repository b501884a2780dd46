//! In-memory shapes of CSV data: [`Row`], [`Node`], and [`KeyedTable`].
//!
//! A [`Row`] maps column names to cell values and remembers insertion order,
//! which is the order cells are written back out. Values are usually text
//! ([`Node::Leaf`]) but may nest another row ([`Node::Nested`]); nested rows are
//! flattened into `"<parent>: <child>"` columns by
//! [`serialize_row`](crate::io::csv::serialize_row).
//!
//! A [`KeyedTable`] maps row keys to rows. Inserting an existing key replaces
//! the row in place (last write wins) and keeps its original position.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashMap;

/// A cell value: text, or a nested row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(String),
    Nested(Row),
}

impl Node {
    /// The text of a leaf, or `None` for a nested row.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Leaf(s) => Some(s),
            Self::Nested(_) => None,
        }
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::Leaf(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::Leaf(value.to_string())
    }
}

impl From<Row> for Node {
    fn from(value: Row) -> Self {
        Self::Nested(value)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(s) => serializer.serialize_str(s),
            Self::Nested(row) => row.serialize(serializer),
        }
    }
}

/// An insertion-ordered mapping from column name to [`Node`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, Node)>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column` to `value`, replacing an existing value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Node>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((column, value)),
        }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Node> {
        self.cells.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    /// Text value of `column`, if present and not nested.
    #[must_use]
    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Node::as_text)
    }

    pub fn remove(&mut self, column: &str) -> Option<Node> {
        let idx = self.cells.iter().position(|(c, _)| c == column)?;
        Some(self.cells.remove(idx).1)
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (k, v) in &self.cells {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Rows indexed by row key, in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct KeyedTable {
    rows: Vec<(String, Row)>,
    index: HashMap<String, usize>,
}

impl KeyedTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the row stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, row: Row) {
        let key = key.into();
        if let Some(&idx) = self.index.get(&key) {
            self.rows[idx].1 = row;
        } else {
            self.index.insert(key.clone(), self.rows.len());
            self.rows.push((key, row));
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Row> {
        self.index.get(key).map(|&idx| &self.rows[idx].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Row> {
        self.index.get(key).map(|&idx| &mut self.rows[idx].1)
    }

    /// Get the row under `key`, inserting an empty one first if absent.
    pub fn entry(&mut self, key: &str) -> &mut Row {
        if !self.index.contains_key(key) {
            self.insert(key, Row::new());
        }
        let idx = self.index[key];
        &mut self.rows[idx].1
    }

    /// Remove `key`, returning its row. Absent keys are not an error.
    pub fn remove(&mut self, key: &str) -> Option<Row> {
        let idx = self.index.remove(key)?;
        let (_, row) = self.rows.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        Some(row)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Row)> {
        self.rows.iter().map(|(k, r)| (k.as_str(), r))
    }
}

impl Serialize for KeyedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for (k, v) in &self.rows {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
