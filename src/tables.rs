//! Recognition of ASCII-art tables in extracted text.
//!
//! A table block looks like this:
//!
//! ```text
//! +------+-------+
//! | Name | Value |
//! +------+-------+
//! | a    | 1     |
//! | b    | 2     |
//! +------+-------+
//! ```
//!
//! It opens with a horizontal rule (`+` and `-` only), holds one or more
//! `|`-delimited rows (interior rules and `|---|` separators are allowed
//! between rows) and closes with a rule that is not followed by another row.
//! The first row supplies the column headers; each following row becomes one
//! record.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// A horizontal rule such as `+----+---+`
    static ref RE_RULE: Regex = Regex::new(r"^\+[-+]+\+$").unwrap();

    /// A row of `|`-delimited cells
    static ref RE_ROW: Regex = Regex::new(r"^\|.+\|$").unwrap();

    /// A markdown-style separator row such as `|---|:--|`
    static ref RE_SEPARATOR: Regex = Regex::new(r"^\|[-+|: ]*-[-+|: ]*\|$").unwrap();
}

/// One data row: column header to cell value, in column order.
pub type TableRow = IndexMap<String, String>;

/// The rows of one recognized table.
pub type TableRecord = Vec<TableRow>;

/// Find every table block in `text` and convert it to records.
///
/// Returns `None` when no usable block is found, so callers can tell
/// "no tables" from "a table with no data rows" (`Some(vec![vec![]])`).
/// Rows whose field count differs from the header are skipped with a
/// warning; a block whose data rows were all rejected is dropped.
pub fn find_tables(text: &str) -> Option<Vec<TableRecord>> {
    let tables: Vec<TableRecord> = find_blocks(text)
        .into_iter()
        .enumerate()
        .filter_map(|(index, rows)| convert_block(index, &rows))
        .collect();

    if tables.is_empty() {
        None
    } else {
        log::debug!("Recognized {} table(s)", tables.len());
        Some(tables)
    }
}

/// Split a row line into trimmed cells.
fn split_cells(line: &str) -> Vec<String> {
    line.trim_matches('|')
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// Locate table blocks and return the row lines (rules removed) of each.
fn find_blocks(text: &str) -> Vec<Vec<&str>> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if !RE_RULE.is_match(lines[i]) {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        let mut closing_rule = None;
        while j < lines.len() {
            if RE_RULE.is_match(lines[j]) {
                closing_rule = Some(j);
                // A rule is interior only when another row follows it
                let row_follows = lines.get(j + 1).is_some_and(|next| RE_ROW.is_match(next));
                if !row_follows {
                    break;
                }
            } else if !RE_ROW.is_match(lines[j]) {
                break;
            }
            j += 1;
        }

        match closing_rule {
            Some(close) => {
                let rows: Vec<&str> = lines[i + 1..close]
                    .iter()
                    .copied()
                    .filter(|line| RE_ROW.is_match(line) && !RE_SEPARATOR.is_match(line))
                    .collect();
                if rows.is_empty() {
                    // Two rules in a row: the second may open the next block
                    i = close;
                } else {
                    blocks.push(rows);
                    i = close + 1;
                }
            },
            None => i += 1,
        }
    }

    blocks
}

/// Turn one block's row lines into records keyed by the header row.
fn convert_block(index: usize, rows: &[&str]) -> Option<TableRecord> {
    let (header_line, data_lines) = rows.split_first()?;
    let headers = split_cells(header_line);

    let mut records = Vec::with_capacity(data_lines.len());
    for line in data_lines {
        let cells = split_cells(line);
        if cells.len() != headers.len() {
            log::warn!(
                "Skipping row in table {}: {} fields against {} headers ({:?})",
                index,
                cells.len(),
                headers.len(),
                line
            );
            continue;
        }
        records.push(headers.iter().cloned().zip(cells).collect::<TableRow>());
    }

    if records.is_empty() && !data_lines.is_empty() {
        log::warn!("Skipping table {}: no row matches its {} headers", index, headers.len());
        return None;
    }

    Some(records)
}
