use csvsql::error::{kind_of, Error, ErrorKind};
use csvsql::grouping::{FileInfo, Grouping};
use csvsql::schema::{ColumnSchema, ColumnType, InferredTable, TableSchema};
use csvsql::sql::*;
use csvsql::Dialect;
use std::path::PathBuf;

fn file(name: &str, headers: &[&str], crlf_count: usize) -> FileInfo {
    FileInfo {
        name: name.to_string(),
        path: PathBuf::from("/data").join(name),
        grouping: "abc".to_string(),
        headers: headers.iter().map(|h| h.to_string()).collect(),
        crlf_count,
        longest_line: 64,
    }
}

fn people_table() -> InferredTable {
    let headers = ["name", "age", "bio"];
    let mut schema = TableSchema::new(&headers.map(String::from));
    let mut record = csv::ByteRecord::new();
    record.push_field(b"Alice");
    record.push_field(b"30");
    record.push_field("x".repeat(300).as_bytes());
    schema.observe_record(&record);
    InferredTable {
        grouping: Grouping {
            id: "abc".to_string(),
            headers: headers.map(String::from).to_vec(),
            files: vec![file("abc01.csv", &headers, 0), file("abc02.csv", &headers, 2)],
        },
        schema,
    }
}

#[test]
fn column_types() {
    let options = SqlOptions::default();
    let int = ColumnSchema { column_type: ColumnType::Integer, length: 9 };
    assert_eq!(column_type(&int, &options), "INT");
    let short = ColumnSchema { column_type: ColumnType::VariableText, length: 255 };
    assert_eq!(column_type(&short, &options), "VARCHAR(255) COLLATE utf8mb4_unicode_ci");
    let long = ColumnSchema { column_type: ColumnType::VariableText, length: 256 };
    assert_eq!(column_type(&long, &options), "TEXT COLLATE utf8mb4_unicode_ci");
}

#[test]
fn quoting() {
    assert_eq!(quote_ident("a`b"), "`a``b`");
    assert_eq!(quote_literal(r"C:\data\it's.csv"), r"'C:\\data\\it\'s.csv'");
}

#[test]
fn create_table_layout() {
    let options = SqlOptions::default().with_display_name("abc", "People");
    let sql = create_table(&people_table(), &options);
    assert_eq!(
        sql,
        "-- People\n\
         DROP TABLE IF EXISTS `People`;\n\
         CREATE TABLE `People` (\n  \
         `id` INT NOT NULL AUTO_INCREMENT PRIMARY KEY,\n  \
         `name` VARCHAR(5) COLLATE utf8mb4_unicode_ci,\n  \
         `age` INT,\n  \
         `bio` TEXT COLLATE utf8mb4_unicode_ci\n\
         );\n"
    );
}

#[test]
fn load_data_line_terminator_per_file() {
    let options = SqlOptions::default();
    let lf = load_data(&file("abc01.csv", &["name", "age"], 0), "abc", &options);
    assert!(lf.contains("LINES TERMINATED BY '\\n'"));
    let crlf = load_data(&file("abc02.csv", &["name", "age"], 1), "abc", &options);
    assert!(crlf.contains("LINES TERMINATED BY '\\r\\n'"));
    assert_eq!(
        crlf,
        "LOAD DATA LOCAL INFILE '/data/abc02.csv' INTO TABLE `abc`\n  \
         FIELDS TERMINATED BY ',' ENCLOSED BY '\"' ESCAPED BY '\"'\n  \
         LINES TERMINATED BY '\\r\\n'\n  \
         IGNORE 1 LINES\n  \
         (`name`, `age`);\n"
    );
}

#[test]
fn load_data_uses_dialect_delimiter() {
    let options = SqlOptions::default().with_dialect(Dialect::new(b';'));
    let sql = load_data(&file("abc01.csv", &["a"], 0), "abc", &options);
    assert!(sql.contains("FIELDS TERMINATED BY ';'"));
}

#[test]
fn names_and_templates() {
    let options = SqlOptions::default()
        .with_table_name_format("import_{id}")
        .with_comment_format("Table for {name} ({id})")
        .with_display_name("abc", "Alphabet");
    assert_eq!(options.table_name("abc"), "import_abc");
    assert_eq!(
        options.clone().with_table_name_format("t_{name}").table_name("abc"),
        "t_Alphabet"
    );
    assert_eq!(options.comment("abc"), "Table for Alphabet (abc)");
    assert_eq!(options.comment("xyz"), "Table for xyz (xyz)");
    assert_eq!(options.display_name("xyz"), "xyz");
}

#[test]
fn script_has_schema_then_data() {
    let options = SqlOptions::default().with_table_name_format("t_{id}");
    let script = render_script(&[people_table()], &options).unwrap();
    let create = script.find("CREATE TABLE `t_abc`").unwrap();
    let data = script.find("-- Data:").unwrap();
    let load1 = script.find("'/data/abc01.csv' INTO TABLE `t_abc`").unwrap();
    let load2 = script.find("'/data/abc02.csv' INTO TABLE `t_abc`").unwrap();
    assert!(create < data && data < load1 && load1 < load2);
    assert_eq!(script.matches("DROP TABLE IF EXISTS").count(), 1);
    assert_eq!(script.matches("LOAD DATA LOCAL INFILE").count(), 2);
    assert_eq!(script.matches("IGNORE 1 LINES").count(), 2);
}

#[test]
fn empty_script() {
    let script = render_script(&[], &SqlOptions::default()).unwrap();
    assert_eq!(script, "-- Schema:\n\n-- Data:\n\n");
}

#[test]
fn table_named_after_display_name_everywhere() {
    let options = SqlOptions::default().with_display_name("abc", "alphabet");
    assert_eq!(options.table_name("abc"), "alphabet");
    assert_eq!(SqlOptions::default().table_name("abc"), "abc");

    let script = render_script(&[people_table()], &options).unwrap();
    assert!(script.contains("-- alphabet\nDROP TABLE IF EXISTS `alphabet`;"));
    assert!(script.contains("CREATE TABLE `alphabet` ("));
    assert_eq!(script.matches("INTO TABLE `alphabet`").count(), 2);
    assert!(!script.contains("`abc`"));
}

#[test]
fn header_named_id_is_rejected() {
    for column in ["id", "ID"] {
        let headers = [column, "name"];
        let table = InferredTable {
            grouping: Grouping {
                id: "abc".to_string(),
                headers: headers.map(String::from).to_vec(),
                files: vec![file("abc01.csv", &headers, 0)],
            },
            schema: TableSchema::new(&headers.map(String::from)),
        };
        assert_eq!(
            kind_of(&check_columns(&table.grouping).unwrap_err()),
            Some(ErrorKind::ReservedColumn)
        );

        let err = render_script(&[people_table(), table], &SqlOptions::default()).unwrap_err();
        let reserved = err.downcast_ref::<Error>().unwrap();
        assert_eq!(reserved.kind(), ErrorKind::ReservedColumn);
        assert_eq!(reserved.path(), Some(PathBuf::from("/data/abc01.csv").as_path()));
        assert!(reserved.message().contains("\"abc\""));
        assert!(reserved.message().contains("abc01.csv"));
    }
}

#[test]
fn header_containing_id_is_accepted() {
    let grouping = Grouping {
        id: "abc".to_string(),
        headers: vec!["user_id".to_string(), "idx".to_string()],
        files: vec![file("abc01.csv", &["user_id", "idx"], 0)],
    };
    assert!(check_columns(&grouping).is_ok());
}
