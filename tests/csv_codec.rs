use anyhow::Result;
use csvsql::error::{kind_of, ErrorKind};
use csvsql::io::csv::*;
use csvsql::testing::*;
use csvsql::{Node, Row};

fn collect_rows(path: &std::path::Path) -> Result<Vec<Vec<String>>> {
    read_rows(path, Dialect::default())?
        .map(|rec| rec.map(|r| r.iter().map(decode_field).collect::<Vec<String>>()))
        .collect()
}

#[test]
fn read_headers_first_line() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.write("people.csv", PEOPLE_CSV)?;
    assert_eq!(read_headers(&path, Dialect::default())?, vec!["id", "name", "age"]);
    Ok(())
}

#[test]
fn read_headers_crlf() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.write("people.csv", PEOPLE_CRLF_CSV)?;
    assert_eq!(read_headers(&path, Dialect::default())?, vec!["id", "name", "age"]);
    Ok(())
}

#[test]
fn read_headers_missing_file() {
    let err = read_headers("/definitely/not/here.csv", Dialect::default()).unwrap_err();
    assert_eq!(kind_of(&err), Some(ErrorKind::FileUnreadable));
}

#[test]
fn read_headers_empty_file() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.write("empty.csv", "")?;
    let err = read_headers(&path, Dialect::default()).unwrap_err();
    assert_eq!(kind_of(&err), Some(ErrorKind::HeaderMissing));
    Ok(())
}

#[test]
fn read_headers_blank_first_line() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.write("blank.csv", "\nid,name\na,b\n")?;
    let err = read_headers(&path, Dialect::default()).unwrap_err();
    assert_eq!(kind_of(&err), Some(ErrorKind::HeaderMissing));
    Ok(())
}

#[test]
fn read_rows_skips_header_and_keeps_quoting() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.write("quoted.csv", QUOTED_CSV)?;
    let rows = collect_rows(&path)?;
    assert_eq!(
        rows,
        vec![
            vec!["q1", "a, b"],
            vec!["q2", "He said \"hi\""],
            vec!["q3", "two\nlines"],
        ]
    );
    Ok(())
}

#[test]
fn read_rows_does_not_pad_short_records() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.write("ragged.csv", RAGGED_CSV)?;
    let rows = collect_rows(&path)?;
    assert_eq!(rows[0], vec!["r1", "Short"]);
    assert_eq!(rows.len(), 4);
    Ok(())
}

#[test]
fn read_rows_with_semicolon_dialect() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.write("semi.csv", "id;v\na;\"x;y\"\n")?;
    let rows: Vec<Vec<String>> = read_rows(&path, Dialect::new(b';'))?
        .map(|rec| rec.map(|r| r.iter().map(decode_field).collect::<Vec<String>>()))
        .collect::<Result<_>>()?;
    assert_eq!(rows, vec![vec!["a", "x;y"]]);
    Ok(())
}

#[test]
fn latin1_fields_decode() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.write("latin1.csv", b"id,city\nc1,Z\xfcrich\n")?;
    let rows = collect_rows(&path)?;
    assert_eq!(rows[0][1], "Zürich");
    Ok(())
}

#[test]
fn scan_lines_counts_crlf_and_longest() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.write("mixed.csv", "id,v\r\na,1\nlonger,22\r\n")?;
    let stats = scan_lines(&path)?;
    assert_eq!(stats.crlf_count, 2);
    assert_eq!(stats.longest_line, "longer,22\r\n".len());
    Ok(())
}

#[test]
fn scan_lines_lf_only() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.write("lf.csv", PEOPLE_CSV)?;
    assert_eq!(scan_lines(&path)?.crlf_count, 0);
    Ok(())
}

#[test]
fn to_row_modes() -> Result<()> {
    let headers: Vec<String> = vec!["id".into(), "name".into(), "age".into()];
    let rec = csv::ByteRecord::from(vec!["p1", "Alice", "30"]);

    let (key, row) = to_row(&rec, &headers, 7, RowKeyMode::FirstColumnStripped).unwrap();
    assert_eq!(key, "p1");
    assert!(!row.contains("id"));
    assert_eq!(row.text("name"), Some("Alice"));

    let (key, row) = to_row(&rec, &headers, 7, RowKeyMode::FirstColumnKept).unwrap();
    assert_eq!(key, "p1");
    assert_eq!(row.text("id"), Some("p1"));

    let (key, row) = to_row(&rec, &headers, 7, RowKeyMode::SequentialIndex).unwrap();
    assert_eq!(key, "7");
    assert_eq!(row.len(), 3);
    Ok(())
}

#[test]
fn to_row_skips_missing_keys() {
    let headers: Vec<String> = vec!["id".into(), "v".into()];
    for key in ["", "0"] {
        let rec = csv::ByteRecord::from(vec![key, "x"]);
        for mode in [
            RowKeyMode::FirstColumnStripped,
            RowKeyMode::FirstColumnKept,
            RowKeyMode::SequentialIndex,
        ] {
            assert!(to_row(&rec, &headers, 1, mode).is_none());
        }
    }
    // "00" is not falsy
    let rec = csv::ByteRecord::from(vec!["00", "x"]);
    assert!(to_row(&rec, &headers, 1, RowKeyMode::FirstColumnKept).is_some());
}

#[test]
fn to_row_drops_fields_past_headers() {
    let headers: Vec<String> = vec!["id".into(), "v".into()];
    let rec = csv::ByteRecord::from(vec!["a", "1", "extra"]);
    let (_, row) = to_row(&rec, &headers, 1, RowKeyMode::FirstColumnKept).unwrap();
    assert_eq!(row.len(), 2);
}

#[test]
fn serialize_cell_quoting() {
    assert_eq!(serialize_cell("He said \"hi\"\r\n", ','), "\"He said \"\"hi\"\"\n\"");
    assert_eq!(serialize_cell("a,b", ','), "\"a,b\"");
    assert_eq!(serialize_cell("a;b", ','), "a;b");
    assert_eq!(serialize_cell("a;b", ';'), "\"a;b\"");
    assert_eq!(serialize_cell("line\nbreak", ','), "\"line\nbreak\"");
    assert_eq!(serialize_cell("plain text", ','), "plain text");
    assert_eq!(serialize_cell("cr\ronly", ','), "cronly");
    assert_eq!(serialize_cell("", ','), "");
}

#[test]
fn serialize_row_flat() {
    let row: Row = [("name", "Alice"), ("note", "a, b")].into_iter().collect();
    let (headers, data) = serialize_row(&row, ',');
    assert_eq!(headers, "name,note\n");
    assert_eq!(data, "Alice,\"a, b\"\n");
}

#[test]
fn serialize_row_nested_prefixes_and_single_newline() {
    let address: Row = [("city", "Paris"), ("zip", "75001")].into_iter().collect();
    let mut row = Row::new();
    row.insert("name", "Alice");
    row.insert("address", Node::Nested(address));
    row.insert("age", "30");
    let (headers, data) = serialize_row(&row, ',');
    assert_eq!(headers, "name,address: city,address: zip,age\n");
    assert_eq!(data, "Alice,Paris,75001,30\n");
}

#[test]
fn serialize_row_deep_nesting_uses_immediate_parent() {
    let inner: Row = [("c", "3")].into_iter().collect();
    let mut middle = Row::new();
    middle.insert("b", "2");
    middle.insert("inner", Node::Nested(inner));
    let mut row = Row::new();
    row.insert("a", "1");
    row.insert("middle", Node::Nested(middle));
    let (headers, data) = serialize_row(&row, ',');
    assert_eq!(headers, "a,middle: b,inner: c\n");
    assert_eq!(data, "1,2,3\n");
}

#[test]
fn serialize_table_empty_has_header() {
    let headers: Vec<String> = vec!["id".into(), "name".into()];
    let text = serialize_table(&csvsql::KeyedTable::new(), &headers, ',');
    assert_eq!(text, "id,name\n");
}

#[test]
fn serialized_row_reads_back() -> Result<()> {
    let row: Row = [
        ("id", "k1"),
        ("quote", "He said \"hi\""),
        ("comma", "x, y"),
        ("newline", "one\ntwo"),
    ]
    .into_iter()
    .collect();
    let (headers, data) = serialize_row(&row, ',');

    let dir = TempDirPath::new()?;
    let path = dir.write("rt.csv", format!("{headers}{data}"))?;
    let header_names = read_headers(&path, Dialect::default())?;
    let mut rows = read_rows(&path, Dialect::default())?;
    let rec = rows.next().unwrap()?;
    let (key, back) = to_row(&rec, &header_names, 1, RowKeyMode::FirstColumnKept).unwrap();
    assert_eq!(key, "k1");
    assert_eq!(back, row);
    assert!(rows.next().is_none());
    Ok(())
}
