//! Cell normalization
//!
//! Turns raw table cells (markdown links, emphasis, inline HTML) into the
//! plain text and link values stored on a job. Both operations are total:
//! they never fail and fall back to the trimmed input or an empty string.

use regex::Regex;
use std::sync::OnceLock;

/// Which link syntax a parser expects to find in its cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSyntax {
    /// `[text](url)`
    Markdown,
    /// `<a href="url">`
    Html,
}

fn markdown_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[([^\]]*)\]\(\s*([^)\s]*)[^)]*\)").expect("valid markdown link pattern")
    })
}

fn href_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).expect("valid href pattern")
    })
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)<[^>]+>").expect("valid tag pattern"))
}

fn line_break_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)</?br\s*/?>").expect("valid <br> pattern"))
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

/// Plain text of a cell.
///
/// `**[Acme](https://acme.example)**` → `Acme`,
/// `<strong><a href="...">Acme</a></strong>` → `Acme`,
/// `**Remote**` → `Remote`.
pub fn extract_text(cell: &str) -> String {
    if let Some(captures) = markdown_link_pattern().captures(cell) {
        let text = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        return strip_emphasis(text);
    }

    if tag_pattern().is_match(cell) {
        return strip_tags(cell);
    }

    let stripped = strip_emphasis(cell);
    if stripped.is_empty() {
        cell.trim().to_string()
    } else {
        stripped
    }
}

/// First link target in a cell, markdown syntax first.
///
/// Returns an empty string when the cell carries no link; callers treat that
/// as "no link", not as an error.
pub fn extract_url(cell: &str) -> String {
    extract_url_with(cell, LinkSyntax::Markdown)
}

/// First link target in a cell, trying `preferred` syntax before the other.
pub fn extract_url_with(cell: &str, preferred: LinkSyntax) -> String {
    let (first, second): (fn(&str) -> Option<String>, fn(&str) -> Option<String>) =
        match preferred {
            LinkSyntax::Markdown => (markdown_url, href_url),
            LinkSyntax::Html => (href_url, markdown_url),
        };

    first(cell).or_else(|| second(cell)).unwrap_or_default()
}

fn markdown_url(cell: &str) -> Option<String> {
    markdown_link_pattern()
        .captures_iter(cell)
        .filter_map(|captures| captures.get(2))
        .map(|m| m.as_str().trim())
        .find(|url| !url.is_empty())
        .map(str::to_string)
}

fn href_url(cell: &str) -> Option<String> {
    href_pattern()
        .captures(cell)
        .and_then(|captures| captures.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|url| !url.is_empty())
}

fn strip_emphasis(text: &str) -> String {
    text.trim()
        .trim_matches(|c: char| c == '*' || c == '[' || c == ']' || c.is_whitespace())
        .to_string()
}

fn strip_tags(cell: &str) -> String {
    let with_breaks = line_break_pattern().replace_all(cell, ", ");
    let without_tags = tag_pattern().replace_all(&with_breaks, "");
    let decoded = decode_entities(&without_tags);
    let collapsed = whitespace_pattern().replace_all(&decoded, " ");
    collapsed
        .trim()
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
