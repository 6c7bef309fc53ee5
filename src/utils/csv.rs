// src/utils/csv.rs

//! Minimal CSV reading and writing for sheet exports and report files.

use std::mem::take;

/// Byte-order mark written at the start of exported files so spreadsheet
/// tools detect UTF-8.
pub const UTF8_BOM: &str = "\u{feff}";

/* ---------------- Parsing ---------------- */

/// Parse CSV text into rows (quotes, doubled quotes and CRLF tolerant).
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Flush a trailing row without newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn push_field(out: &mut String, cell: &str) {
    if needs_quotes(cell) {
        out.push('"');
        out.push_str(&cell.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(cell);
    }
}

/// Append one CSV row, newline included.
pub fn push_row(out: &mut String, row: &[String]) {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, cell);
    }
    out.push('\n');
}

/// Render a header plus rows as a CSV string with a leading BOM.
pub fn to_csv_string(header: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::from(UTF8_BOM);
    push_row(&mut out, header);
    for r in rows {
        push_row(&mut out, r);
    }
    out
}
