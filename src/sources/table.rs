//! Table row extraction
//!
//! Listing documents keep their jobs in either markdown pipe tables or HTML
//! `<table>` blocks, and neither is kept tidy. The extractors here only find
//! candidate rows and split them into raw cells; deciding whether a row is a
//! usable job (enough cells, non-empty fields) is left to the source parser.

use regex::Regex;
use std::sync::OnceLock;

fn table_row_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").expect("valid <tr> pattern"))
}

fn table_cell_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>").expect("valid <td> pattern"))
}

/// Iterate markdown pipe-table rows in document order.
///
/// A line is a row when it starts with `|`. Separator lines (only pipes,
/// dashes, colons and whitespace) and header lines mentioning `Company` are
/// skipped. The empty fragments produced by the leading and trailing pipe are
/// dropped; interior cells are kept even when blank so column positions stay
/// stable.
pub fn markdown_rows(document: &str) -> impl Iterator<Item = Vec<String>> + '_ {
    document
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('|'))
        .filter(|line| !is_separator_line(line) && !line.contains("Company"))
        .map(split_pipe_row)
}

/// Iterate HTML table rows in document order.
///
/// Each `<tr>` block becomes the list of its `<td>` contents with inner
/// markup left intact for the field normalizer. Rows without any `<td>`
/// (header rows built from `<th>`) are skipped.
pub fn html_rows(document: &str) -> impl Iterator<Item = Vec<String>> + '_ {
    table_row_pattern()
        .captures_iter(document)
        .filter_map(|row| row.get(1))
        .map(|row| {
            table_cell_pattern()
                .captures_iter(row.as_str())
                .filter_map(|cell| cell.get(1))
                .map(|cell| cell.as_str().trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
}

/// Whether the document carries HTML tables at all.
pub fn has_html_table(document: &str) -> bool {
    let lowered = document.to_ascii_lowercase();
    lowered.contains("<table") || lowered.contains("<tr")
}

fn is_separator_line(line: &str) -> bool {
    line.chars()
        .all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

fn split_pipe_row(line: &str) -> Vec<String> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}
