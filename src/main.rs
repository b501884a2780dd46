//! `csvsql` command-line entry point.
//!
//! Parses arguments, runs one command, writes results to stdout, and reports
//! failures on stderr with exit code 1.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueHint};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use csvsql::io::csv::read_headers;
use csvsql::{
    add_item, create_new, delete_data, generate_sql_for_dir, load_table, Dialect, LoadOptions,
    LocalFileStore, Node, Row, SqlOptions, DEFAULT_BACKUP_SUFFIX,
};

#[derive(Parser)]
#[command(
    name = "csvsql",
    version,
    about = "Keyed CSV tables and MySQL import scripts for families of CSV files",
    long_about = None,
    after_help = r#"EXAMPLES
  $ csvsql sql data/ --pattern '([a-z]{3})[0-9]{2}\.csv' -o import.sql
  $ csvsql show people.csv --keep-key
  $ csvsql add people.csv '{"p4": {"name": "Dave", "age": "35"}}'
  $ csvsql delete people.csv p2 p3"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    #[arg(
        long,
        global = true,
        default_value = ",",
        value_parser = parse_delimiter,
        help = "Field delimiter (a single ASCII character)"
    )]
    delimiter: u8,
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_BACKUP_SUFFIX,
        help = "Suffix for the backup copy written before a file is rewritten"
    )]
    backup_suffix: String,
    #[arg(long, global = true, help = "Rewrite files without a backup copy")]
    no_backup: bool,
}

impl GlobalArgs {
    fn dialect(&self) -> Dialect {
        Dialect::new(self.delimiter)
    }

    fn backup(&self) -> Option<&str> {
        if self.no_backup {
            None
        } else {
            Some(self.backup_suffix.as_str())
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Infer table schemas for a directory of CSV files and print a MySQL script")]
    Sql {
        #[arg(help = "Directory holding the CSV files", value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        #[arg(long, help = "Filename regex with one capture group naming the grouping")]
        pattern: String,
        #[arg(
            long,
            help = "JSON object mapping grouping ids to display names",
            value_hint = ValueHint::FilePath
        )]
        names: Option<PathBuf>,
        #[arg(long, help = "Collation for text columns")]
        collation: Option<String>,
        #[arg(long, help = "Table name template; {name} is the display name, {id} the grouping id")]
        table_format: Option<String>,
        #[arg(long, help = "Comment template; {name} is the display name")]
        comment_format: Option<String>,
        #[arg(long = "ext", help = "File extension to include (repeatable, default: csv)")]
        extensions: Vec<String>,
        #[arg(short, long, help = "Write the script here instead of stdout", value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    #[command(about = "Print the header line of a CSV file")]
    Headers {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    #[command(about = "Print a CSV file as a JSON object keyed by row key")]
    Show {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long, help = "Keep the key column in each row")]
        keep_key: bool,
        #[arg(long, help = "Key rows by their 1-based position")]
        sequential: bool,
    },
    #[command(about = "Add or replace rows from a JSON object {key: {column: value}}")]
    Add {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(help = "Inline JSON object")]
        items: String,
    },
    #[command(about = "Delete rows by key")]
    Delete {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    #[command(about = "Create a CSV file holding only a header line")]
    Create {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(required = true)]
        headers: Vec<String>,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let global = &cli.global;
    match cli.command {
        Command::Sql {
            dir,
            pattern,
            names,
            collation,
            table_format,
            comment_format,
            extensions,
            output,
        } => {
            let mut options = SqlOptions::default().with_dialect(global.dialect());
            if let Some(path) = names {
                options = options.with_display_names(read_names(&path)?);
            }
            if let Some(collation) = collation {
                options = options.with_collation(collation);
            }
            if let Some(format) = table_format {
                options = options.with_table_name_format(format);
            }
            if let Some(format) = comment_format {
                options = options.with_comment_format(format);
            }
            if !extensions.is_empty() {
                options = options.with_extensions(extensions);
            }
            let script = generate_sql_for_dir(&dir, &pattern, &options)?;
            match output {
                Some(path) => {
                    fs::write(&path, script).with_context(|| format!("write {}", path.display()))?;
                }
                None => io::stdout().write_all(script.as_bytes())?,
            }
        }
        Command::Headers { file } => {
            let headers = read_headers(&file, global.dialect())?;
            println!("{}", headers.join(&char::from(global.delimiter).to_string()));
        }
        Command::Show {
            file,
            keep_key,
            sequential,
        } => {
            let options = LoadOptions::default()
                .with_strip_key(!keep_key)
                .with_sequential_index(sequential)
                .with_dialect(global.dialect());
            let table = load_table(&file, options)?;
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
        Command::Add { file, items } => {
            let items = parse_items(&items)?;
            add_item(&LocalFileStore, &file, items, global.dialect(), global.backup())?;
        }
        Command::Delete { file, keys } => {
            delete_data(&LocalFileStore, &file, &keys, global.dialect(), global.backup())?;
        }
        Command::Create { file, headers } => {
            create_new(&LocalFileStore, &file, headers.as_slice(), global.dialect())?;
        }
    }
    Ok(())
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(format!("delimiter must be one ASCII character, got {s:?}")),
    }
}

fn read_names(path: &Path) -> Result<BTreeMap<String, String>> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse display names in {}", path.display()))
}

/// Items in the order they appear in `json`; `serde_json` is built with
/// `preserve_order`, so new keys are appended in that order.
fn parse_items(json: &str) -> Result<Vec<(String, Row)>> {
    let parsed: serde_json::Map<String, Value> =
        serde_json::from_str(json).context("items must be a JSON object of objects")?;
    parsed
        .into_iter()
        .map(|(key, fields)| -> Result<(String, Row)> {
            match fields {
                Value::Object(fields) => Ok((key, object_to_row(fields))),
                other => bail!("item {key:?} must be a JSON object, got {other}"),
            }
        })
        .collect()
}

fn object_to_row(fields: serde_json::Map<String, Value>) -> Row {
    fields
        .into_iter()
        .map(|(column, value)| (column, value_to_node(value)))
        .collect()
}

fn value_to_node(value: Value) -> Node {
    match value {
        Value::String(s) => Node::Leaf(s),
        Value::Null => Node::Leaf(String::new()),
        Value::Object(map) => Node::Nested(object_to_row(map)),
        other => Node::Leaf(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_items_keeps_json_order() {
        let json = r#"{"p9": {"name": "Zed"}, "p1": {"age": 3, "name": "Al"}}"#;
        let items = parse_items(json).unwrap();
        let keys: Vec<_> = items.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["p9", "p1"]);
        assert_eq!(items[1].1.columns().collect::<Vec<_>>(), vec!["age", "name"]);
        assert_eq!(items[1].1.text("age"), Some("3"));
    }

    #[test]
    fn parse_items_rejects_non_object_rows() {
        assert!(parse_items(r#"{"p1": "flat"}"#).is_err());
        assert!(parse_items("[]").is_err());
    }
}
