//! Pre-built CSV documents for common testing scenarios.

/// Three people keyed by id, LF line endings.
pub const PEOPLE_CSV: &str = "id,name,age\n\
p1,Alice,30\n\
p2,Bob,41\n\
p3,Carol,27\n";

/// Same layout as [`PEOPLE_CSV`] with CRLF line endings.
pub const PEOPLE_CRLF_CSV: &str = "id,name,age\r\n\
p4,Dave,35\r\n\
p5,Eve,29\r\n";

/// Cells that need quoting: an embedded delimiter, quotes, and a newline.
pub const QUOTED_CSV: &str = "id,note\n\
q1,\"a, b\"\n\
q2,\"He said \"\"hi\"\"\"\n\
q3,\"two\nlines\"\n";

/// A short row, a row with an empty key, and a row keyed `0`.
pub const RAGGED_CSV: &str = "id,name,age\n\
r1,Short\n\
,Nobody,50\n\
0,Zero,60\n\
r2,Full,70\n";

/// Build a CSV document from a header line and data lines, joined with `terminator`.
///
/// # Example
///
/// ```
/// use csvsql::testing::csv_text;
///
/// let text = csv_text(&["id,v", "a,1"], "\r\n");
/// assert_eq!(text, "id,v\r\na,1\r\n");
/// ```
#[must_use]
pub fn csv_text(lines: &[&str], terminator: &str) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push_str(terminator);
    }
    out
}
