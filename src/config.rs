//! Widget configuration
//!
//! `WidgetConfig` is captured once when a widget is attached. Defaults apply
//! only to fields the caller leaves alone.

use crate::client::SearchResult;
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::render::default_format_result;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Default minimum query length
pub const DEFAULT_MIN_CHARS: usize = 2;
/// Default quiet period before a search fires
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
/// Default query parameter name
pub const DEFAULT_QUERY_PARAM: &str = "q";

// ============================================================================
// Selection
// ============================================================================

/// What a selection strategy may touch
pub struct Selection<'a> {
    document: &'a mut Document,
    input: NodeId,
}

impl<'a> Selection<'a> {
    pub(crate) fn new(document: &'a mut Document, input: NodeId) -> Self {
        Self { document, input }
    }

    pub fn input(&self) -> NodeId {
        self.input
    }

    pub fn input_value(&self) -> Result<&str> {
        self.document.value(self.input)
    }

    pub fn set_input_value(&mut self, value: &str) -> Result<()> {
        self.document.set_value(self.input, value)
    }

    /// Full-page navigation
    pub fn navigate(&mut self, url: &str) {
        self.document.navigate(url);
    }

    pub fn document(&mut self) -> &mut Document {
        &mut *self.document
    }
}

type SelectCallback = Box<dyn FnMut(&SearchResult, &mut Selection<'_>) -> Result<()>>;

/// Behaviour when the user picks a result
#[derive(Default)]
pub enum OnSelect {
    /// Write the result's name into the input
    FillInput,
    /// Write the name, then navigate to the result's url when it has one
    #[default]
    FillAndNavigate,
    Custom(SelectCallback),
}

impl OnSelect {
    pub fn custom<F>(callback: F) -> Self
    where
        F: FnMut(&SearchResult, &mut Selection<'_>) -> Result<()> + 'static,
    {
        OnSelect::Custom(Box::new(callback))
    }

    pub(crate) fn apply(&mut self, result: &SearchResult, selection: &mut Selection<'_>) -> Result<()> {
        match self {
            OnSelect::FillInput => selection.set_input_value(&result.name),
            OnSelect::FillAndNavigate => {
                selection.set_input_value(&result.name)?;
                if let Some(url) = result.navigation_url() {
                    selection.navigate(url);
                }
                Ok(())
            }
            OnSelect::Custom(callback) => callback(result, selection),
        }
    }
}

impl fmt::Debug for OnSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnSelect::FillInput => write!(f, "FillInput"),
            OnSelect::FillAndNavigate => write!(f, "FillAndNavigate"),
            OnSelect::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

// ============================================================================
// Formatting
// ============================================================================

type FormatCallback = Box<dyn Fn(&SearchResult, &str) -> String>;

/// Produces the inner markup of a result row
#[derive(Default)]
pub enum FormatResult {
    /// Highlighted name plus secondary identifier line
    #[default]
    Highlighted,
    /// Caller markup; must escape untrusted text itself
    Custom(FormatCallback),
}

impl FormatResult {
    pub fn custom<F>(format: F) -> Self
    where
        F: Fn(&SearchResult, &str) -> String + 'static,
    {
        FormatResult::Custom(Box::new(format))
    }

    pub fn format(&self, result: &SearchResult, query: &str) -> String {
        match self {
            FormatResult::Highlighted => default_format_result(result, query),
            FormatResult::Custom(format) => format(result, query),
        }
    }
}

impl fmt::Debug for FormatResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatResult::Highlighted => write!(f, "Highlighted"),
            FormatResult::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

// ============================================================================
// Widget configuration
// ============================================================================

/// Configuration captured when a widget is attached
#[derive(Debug)]
pub struct WidgetConfig {
    /// Minimum trimmed query length that triggers a search
    pub min_chars: usize,
    /// Quiet period after the last keystroke
    pub debounce: Duration,
    /// Name of the query parameter sent to the endpoint
    pub query_param: String,
    /// Selection strategy
    pub on_select: OnSelect,
    /// Row formatter
    pub format_result: FormatResult,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
            debounce: DEFAULT_DEBOUNCE,
            query_param: DEFAULT_QUERY_PARAM.to_string(),
            on_select: OnSelect::default(),
            format_result: FormatResult::default(),
        }
    }
}

impl WidgetConfig {
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_query_param(mut self, param: impl Into<String>) -> Self {
        self.query_param = param.into();
        self
    }

    pub fn with_on_select(mut self, on_select: OnSelect) -> Self {
        self.on_select = on_select;
        self
    }

    pub fn with_format_result(mut self, format_result: FormatResult) -> Self {
        self.format_result = format_result;
        self
    }

    /// Overlay the fields present in `options`
    pub fn with_options(mut self, options: &WidgetOptions) -> Self {
        if let Some(min_chars) = options.min_chars {
            self.min_chars = min_chars;
        }
        if let Some(ms) = options.debounce_time {
            self.debounce = Duration::from_millis(ms);
        }
        if let Some(param) = &options.query_param {
            self.query_param = param.clone();
        }
        self
    }
}

/// Options object as it appears in page markup or JSON config.
///
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetOptions {
    pub min_chars: Option<usize>,
    /// Milliseconds
    pub debounce_time: Option<u64>,
    pub query_param: Option<String>,
}

impl WidgetOptions {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl From<WidgetOptions> for WidgetConfig {
    fn from(options: WidgetOptions) -> Self {
        WidgetConfig::default().with_options(&options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = WidgetConfig::default();
        assert_eq!(config.min_chars, 2);
        assert_eq!(config.debounce, Duration::from_millis(300));
        assert_eq!(config.query_param, "q");
        assert!(matches!(config.on_select, OnSelect::FillAndNavigate));
        assert!(matches!(config.format_result, FormatResult::Highlighted));
    }

    #[test]
    fn caller_values_win_even_when_zero() {
        let options = WidgetOptions::from_json(r#"{"minChars": 0, "debounceTime": 0}"#).unwrap();
        let config = WidgetConfig::from(options);
        assert_eq!(config.min_chars, 0);
        assert_eq!(config.debounce, Duration::ZERO);
    }

    #[test]
    fn unknown_option_keys_are_ignored() {
        let options =
            WidgetOptions::from_json(r#"{"debounceTime": 150, "placeholder": "Buscar", "extra": [1]}"#)
                .unwrap();
        assert_eq!(
            options,
            WidgetOptions {
                min_chars: None,
                debounce_time: Some(150),
                query_param: None,
            }
        );
    }

    #[test]
    fn negative_min_chars_is_rejected() {
        assert!(WidgetOptions::from_json(r#"{"minChars": -1}"#).is_err());
    }

    #[test]
    fn fill_and_navigate_follows_url() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        let result = SearchResult::new("Mouse Gamer").with_url("/products/1/");

        OnSelect::FillAndNavigate
            .apply(&result, &mut Selection::new(&mut doc, input))
            .unwrap();

        assert_eq!(doc.value(input).unwrap(), "Mouse Gamer");
        assert_eq!(doc.location(), Some("/products/1/"));
    }

    #[test]
    fn fill_input_never_navigates() {
        let mut doc = Document::new();
        let input = doc.create_element("input");
        let result = SearchResult::new("Mouse Gamer").with_url("/products/1/");

        OnSelect::FillInput
            .apply(&result, &mut Selection::new(&mut doc, input))
            .unwrap();

        assert_eq!(doc.value(input).unwrap(), "Mouse Gamer");
        assert_eq!(doc.location(), None);
    }

    #[test]
    fn custom_formatter_is_used() {
        let format = FormatResult::custom(|r, q| format!("{q}:{}", r.name));
        assert_eq!(format.format(&SearchResult::new("A"), "x"), "x:A");
    }
}
