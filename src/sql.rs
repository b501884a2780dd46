//! MySQL script generation from inferred schemas.
//!
//! The script has two parts:
//!
//! 1. For each grouping, a comment line, `DROP TABLE IF EXISTS`, and
//!    `CREATE TABLE` with a synthetic auto-increment `id` key followed by one
//!    column per header.
//! 2. A `-- Data:` section with one `LOAD DATA LOCAL INFILE` per source file.
//!
//! Tables are named from each grouping's display name (the grouping id unless
//! [`SqlOptions::display_names`] says otherwise) through
//! [`SqlOptions::table_name_format`]. A header called `id` would clash with the
//! generated key, so such groupings are rejected.
//!
//! Integer columns are `INT`. Text columns are `VARCHAR(length)`, or `TEXT` once
//! the length exceeds [`SqlOptions::text_threshold`], and carry the configured
//! collation. Each file's bulk load ends lines with `\r\n` if that file contained
//! any CRLF line ending, else `\n`.

use crate::error::{Error, ErrorKind};
use crate::grouping::{FileInfo, Grouping};
use crate::io::csv::Dialect;
use crate::schema::{ColumnSchema, ColumnType, InferredTable};
use anyhow::Result;
use std::collections::BTreeMap;

/// Placeholder replaced by a grouping's display name in the name and comment templates.
pub const NAME_PLACEHOLDER: &str = "{name}";
/// Placeholder replaced by the grouping id in the name and comment templates.
pub const ID_PLACEHOLDER: &str = "{id}";
/// Name of the synthetic auto-increment key that leads every generated table.
pub const ID_COLUMN: &str = "id";

/// Options for script generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlOptions {
    /// Human-readable names by grouping id. Ids not listed use the id itself.
    pub display_names: BTreeMap<String, String>,
    /// Template for each table's comment line.
    pub comment_format: String,
    /// Template for each table's name. Used by `DROP`, `CREATE` and `LOAD DATA` alike.
    pub table_name_format: String,
    /// Collation applied to text columns.
    pub collation: String,
    /// Longest `VARCHAR`; longer text columns become `TEXT`.
    pub text_threshold: usize,
    /// File extensions considered when listing a directory.
    pub extensions: Vec<String>,
    pub dialect: Dialect,
}

impl Default for SqlOptions {
    fn default() -> Self {
        Self {
            display_names: BTreeMap::new(),
            comment_format: NAME_PLACEHOLDER.to_string(),
            table_name_format: NAME_PLACEHOLDER.to_string(),
            collation: "utf8mb4_unicode_ci".to_string(),
            text_threshold: 255,
            extensions: vec!["csv".to_string()],
            dialect: Dialect::default(),
        }
    }
}

impl SqlOptions {
    #[must_use]
    pub fn with_display_names(mut self, names: BTreeMap<String, String>) -> Self {
        self.display_names = names;
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.display_names.insert(id.into(), name.into());
        self
    }

    #[must_use]
    pub fn with_comment_format(mut self, format: impl Into<String>) -> Self {
        self.comment_format = format.into();
        self
    }

    #[must_use]
    pub fn with_table_name_format(mut self, format: impl Into<String>) -> Self {
        self.table_name_format = format.into();
        self
    }

    #[must_use]
    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = collation.into();
        self
    }

    #[must_use]
    pub fn with_extensions<S: Into<String>>(mut self, extensions: impl IntoIterator<Item = S>) -> Self {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Display name of a grouping, defaulting to its id.
    #[must_use]
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.display_names.get(id).map_or(id, String::as_str)
    }

    /// Table name of a grouping: the name template filled with its display name.
    #[must_use]
    pub fn table_name(&self, id: &str) -> String {
        self.fill(&self.table_name_format, id)
    }

    /// Comment text for a grouping.
    #[must_use]
    pub fn comment(&self, id: &str) -> String {
        self.fill(&self.comment_format, id)
    }

    fn fill(&self, template: &str, id: &str) -> String {
        template
            .replace(NAME_PLACEHOLDER, self.display_name(id))
            .replace(ID_PLACEHOLDER, id)
    }
}

/// Quote an identifier with backticks.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a string literal with single quotes.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// SQL type (and collation, for text) of one inferred column.
#[must_use]
pub fn column_type(column: &ColumnSchema, options: &SqlOptions) -> String {
    match column.column_type {
        ColumnType::Integer => "INT".to_string(),
        ColumnType::VariableText if column.length > options.text_threshold => {
            format!("TEXT COLLATE {}", options.collation)
        }
        ColumnType::VariableText => {
            format!("VARCHAR({}) COLLATE {}", column.length, options.collation)
        }
    }
}

/// Fail if any header of `grouping` names the synthetic primary key column.
///
/// MySQL compares column names without regard to case, so `ID` collides too.
///
/// # Errors
/// Fails with [`ErrorKind::ReservedColumn`] naming the grouping and its first file.
pub fn check_columns(grouping: &Grouping) -> Result<()> {
    let Some(column) = grouping
        .headers
        .iter()
        .find(|h| h.eq_ignore_ascii_case(ID_COLUMN))
    else {
        return Ok(());
    };
    let file = grouping.files.first();
    let mut err = Error::new(
        ErrorKind::ReservedColumn,
        format!(
            "grouping {:?} ({}) has column {column:?}, which clashes with the generated key",
            grouping.id,
            file.map_or("no files", |f| f.name.as_str()),
        ),
    );
    if let Some(file) = file {
        err = err.with_path(&file.path);
    }
    Err(err.into())
}

/// `DROP TABLE IF EXISTS` and `CREATE TABLE` for one grouping, preceded by its comment.
#[must_use]
pub fn create_table(table: &InferredTable, options: &SqlOptions) -> String {
    let id = &table.grouping.id;
    let name = quote_ident(&options.table_name(id));
    let mut lines = vec![format!(
        "  {} INT NOT NULL AUTO_INCREMENT PRIMARY KEY",
        quote_ident(ID_COLUMN)
    )];
    for (column, schema) in table.schema.columns() {
        lines.push(format!(
            "  {} {}",
            quote_ident(column),
            column_type(schema, options)
        ));
    }
    format!(
        "-- {}\nDROP TABLE IF EXISTS {name};\nCREATE TABLE {name} (\n{}\n);\n",
        options.comment(id),
        lines.join(",\n")
    )
}

/// `LOAD DATA LOCAL INFILE` for one file into `table_name`.
#[must_use]
pub fn load_data(file: &FileInfo, table_name: &str, options: &SqlOptions) -> String {
    let terminator = if file.uses_crlf() { "\\r\\n" } else { "\\n" };
    let columns = file
        .headers
        .iter()
        .map(|h| quote_ident(h))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "LOAD DATA LOCAL INFILE {} INTO TABLE {}\n  \
         FIELDS TERMINATED BY {} ENCLOSED BY '\"' ESCAPED BY '\"'\n  \
         LINES TERMINATED BY '{terminator}'\n  \
         IGNORE 1 LINES\n  \
         ({columns});\n",
        quote_literal(&file.path.display().to_string()),
        quote_ident(table_name),
        quote_literal(&options.dialect.delimiter_char().to_string()),
    )
}

/// Render the full script for `tables`, schema first, then data.
///
/// # Errors
/// Fails with [`ErrorKind::ReservedColumn`] if a grouping has a column named
/// like the generated key; nothing is rendered in that case.
pub fn render_script(tables: &[InferredTable], options: &SqlOptions) -> Result<String> {
    for table in tables {
        check_columns(&table.grouping)?;
    }
    let mut out = String::from("-- Schema:\n\n");
    for table in tables {
        out.push_str(&create_table(table, options));
        out.push('\n');
    }
    out.push_str("-- Data:\n\n");
    for table in tables {
        let id = &table.grouping.id;
        let table_name = options.table_name(id);
        out.push_str("-- ");
        out.push_str(&options.comment(id));
        out.push('\n');
        for file in &table.grouping.files {
            out.push_str(&load_data(file, &table_name, options));
        }
        out.push('\n');
    }
    Ok(out)
}
