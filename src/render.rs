//! Dropdown rendering
//!
//! Turns a panel state into rows of markup. Rows are plain data; the widget
//! materialises them as elements inside the results panel.

use crate::client::SearchResult;
use maud::{html, Markup, PreEscaped};
use regex::{Regex, RegexBuilder};

pub const ROW_LOADING: &str = "autocomplete-loading";
pub const ROW_EMPTY: &str = "autocomplete-empty";
pub const ROW_ERROR: &str = "text-danger";
pub const ROW_ITEM: &str = "autocomplete-item";
pub const HIGHLIGHT: &str = "highlight";

pub const LOADING_TEXT: &str = "Searching...";
pub const ERROR_TEXT: &str = "Search failed";

/// One row of the results panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRow {
    /// Class list of the row element
    pub classes: Vec<&'static str>,
    /// Trusted inner markup
    pub html: String,
    /// Index into the result list for selectable rows
    pub result: Option<usize>,
}

impl PanelRow {
    fn status(classes: Vec<&'static str>, markup: Markup) -> Self {
        Self {
            classes,
            html: markup.into_string(),
            result: None,
        }
    }
}

pub fn loading_row() -> PanelRow {
    PanelRow::status(
        vec![ROW_LOADING],
        html! { i class="fas fa-spinner fa-spin" {} " " (LOADING_TEXT) },
    )
}

pub fn error_row() -> PanelRow {
    PanelRow::status(
        vec![ROW_EMPTY, ROW_ERROR],
        html! { i class="fas fa-exclamation-triangle" {} " " (ERROR_TEXT) },
    )
}

/// "No results" row; the query is escaped
pub fn empty_row(query: &str) -> PanelRow {
    PanelRow::status(
        vec![ROW_EMPTY],
        html! { "No results found for " (PreEscaped("\"")) (query) (PreEscaped("\"")) },
    )
}

/// One selectable row per result, inner markup from `format`
pub fn result_rows<F>(results: &[SearchResult], query: &str, format: F) -> Vec<PanelRow>
where
    F: Fn(&SearchResult, &str) -> String,
{
    results
        .iter()
        .enumerate()
        .map(|(index, result)| PanelRow {
            classes: vec![ROW_ITEM],
            html: format(result, query),
            result: Some(index),
        })
        .collect()
}

// ============================================================================
// Highlighting
// ============================================================================

/// Piece of a highlighted string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Match(&'a str),
}

/// Case-insensitive pattern for the literal query.
///
/// Returns `None` for an empty query.
pub fn highlight_pattern(query: &str) -> Option<Regex> {
    if query.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Split `text` into plain and matching segments
pub fn split_matches<'a>(text: &'a str, pattern: Option<&Regex>) -> Vec<Segment<'a>> {
    let Some(pattern) = pattern else {
        return vec![Segment::Plain(text)];
    };

    let mut segments = Vec::new();
    let mut last = 0;
    for m in pattern.find_iter(text) {
        if m.start() > last {
            segments.push(Segment::Plain(&text[last..m.start()]));
        }
        segments.push(Segment::Match(m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        segments.push(Segment::Plain(&text[last..]));
    }
    segments
}

/// Escape `text` and wrap every occurrence of `query` in a highlight span
pub fn highlight(text: &str, query: &str) -> Markup {
    let pattern = highlight_pattern(query);
    let segments = split_matches(text, pattern.as_ref());
    html! {
        @for segment in &segments {
            @match segment {
                Segment::Plain(plain) => { (plain) }
                Segment::Match(hit) => { span class=(HIGHLIGHT) { (hit) } }
            }
        }
    }
}

/// Default row formatter: highlighted name over the secondary identifier
pub fn default_format_result(result: &SearchResult, query: &str) -> String {
    html! {
        div class="autocomplete-item-title" { (highlight(&result.name, query)) }
        div class="autocomplete-item-subtitle" { (result.secondary_text()) }
    }
    .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn highlights_every_match_case_insensitively() {
        assert_eq!(
            highlight("Widget wide", "wid").into_string(),
            "<span class=\"highlight\">Wid</span>get <span class=\"highlight\">wid</span>e"
        );
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert_eq!(
            highlight("Cable (2m) + adapter", "(2m) +").into_string(),
            "Cable <span class=\"highlight\">(2m) +</span> adapter"
        );
        // an unescaped "[" would not even compile as a pattern
        assert_eq!(
            highlight("a[b", "[").into_string(),
            "a<span class=\"highlight\">[</span>b"
        );
        assert_eq!(highlight("abc", ".").into_string(), "abc");
    }

    #[test]
    fn highlighted_text_is_escaped() {
        assert_eq!(
            highlight("<b>bold</b>", "bold").into_string(),
            "&lt;b&gt;<span class=\"highlight\">bold</span>&lt;/b&gt;"
        );
    }

    #[test]
    fn empty_query_highlights_nothing() {
        assert_eq!(split_matches("abc", highlight_pattern("").as_ref()), vec![Segment::Plain("abc")]);
    }

    #[test]
    fn default_formatter_shows_secondary_line() {
        let result = SearchResult::new("Widget A").with_sku("W1");
        assert_eq!(
            default_format_result(&result, "wid"),
            "<div class=\"autocomplete-item-title\"><span class=\"highlight\">Wid</span>get A</div>\
             <div class=\"autocomplete-item-subtitle\">W1</div>"
        );
    }

    #[test]
    fn empty_row_escapes_query() {
        let row = empty_row("<script>alert(1)</script>");
        assert_eq!(row.classes, vec![ROW_EMPTY]);
        assert!(row.html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!row.html.contains("<script>"));
    }

    #[test]
    fn empty_row_quotes_query() {
        assert_eq!(empty_row("xyz").html, "No results found for \"xyz\"");
    }

    #[test]
    fn result_rows_keep_order_and_indices() {
        let results = vec![SearchResult::new("a"), SearchResult::new("b")];
        let rows = result_rows(&results, "q", |r, _| r.name.clone());
        assert_eq!(
            rows.iter().map(|r| (r.html.as_str(), r.result)).collect::<Vec<_>>(),
            vec![("a", Some(0)), ("b", Some(1))]
        );
    }

    #[test]
    fn status_rows_are_not_selectable() {
        assert_eq!(loading_row().result, None);
        assert_eq!(error_row().classes, vec![ROW_EMPTY, ROW_ERROR]);
        assert!(error_row().html.contains(ERROR_TEXT));
    }
}
