//! The autocomplete widget
//!
//! Binds to one input element, owns the results panel next to it and moves
//! the panel between its states in response to events routed by the page.

use crate::client::SearchResult;
use crate::config::{Selection, WidgetConfig};
use crate::dom::{Document, NodeId};
use crate::error::{Result, TypeaheadError};
use crate::executor::{SearchOutcome, SearchRequest};
use crate::page::WidgetId;
use crate::render::{self, PanelRow};
use crate::scheduler::{Keystroke, QueryScheduler};
use std::time::Instant;

pub const WRAPPER_CLASS: &str = "autocomplete-container";
pub const PANEL_CLASS: &str = "autocomplete-results";
pub const INPUT_CLASS: &str = "autocomplete-input";
pub const ICON_CLASSES: &str = "fas fa-search autocomplete-icon";
pub const SHOW_CLASS: &str = "show";

/// Visible state of the results panel
#[derive(Debug, Clone, PartialEq)]
pub enum PanelState {
    Closed,
    Loading,
    Empty { query: String },
    Error,
    Results { query: String, results: Vec<SearchResult> },
}

impl PanelState {
    pub fn label(&self) -> &'static str {
        match self {
            PanelState::Closed => "closed",
            PanelState::Loading => "loading",
            PanelState::Empty { .. } => "empty",
            PanelState::Error => "error",
            PanelState::Results { .. } => "showing-results",
        }
    }
}

/// What the panel holds, independent of whether it is shown
#[derive(Debug, Clone, PartialEq, Default)]
enum PanelContent {
    #[default]
    Blank,
    Loading,
    Empty { query: String },
    Error,
    Results { query: String, results: Vec<SearchResult> },
}

/// Elements created around the bound input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scaffold {
    pub input: NodeId,
    pub wrapper: NodeId,
    pub panel: NodeId,
    pub icon: NodeId,
}

/// A type-ahead widget bound to one input
#[derive(Debug)]
pub struct Autocomplete {
    id: WidgetId,
    endpoint: String,
    config: WidgetConfig,
    scaffold: Scaffold,
    scheduler: QueryScheduler,
    content: PanelContent,
    visible: bool,
    /// Row element and the index of the result it selects
    rows: Vec<(NodeId, usize)>,
    /// Outcomes carrying any other ticket are stale
    latest_ticket: u64,
    ticket_seq: u64,
}

impl Autocomplete {
    /// Build the scaffold around `input`.
    ///
    /// The input moves into a new wrapper that takes its place in the tree;
    /// the wrapper also holds the hidden results panel and the search icon.
    pub(crate) fn attach(
        document: &mut Document,
        id: WidgetId,
        input: NodeId,
        endpoint: &str,
        config: WidgetConfig,
    ) -> Result<Self> {
        document.get(input)?;
        let parent = document
            .parent(input)
            .ok_or(TypeaheadError::NotAttachedToTree(input))?;

        let wrapper = document.create_element("div");
        document.set_class_name(wrapper, WRAPPER_CLASS)?;
        let panel = document.create_element("div");
        document.set_class_name(panel, PANEL_CLASS)?;

        document.insert_before(parent, wrapper, input)?;
        document.append_child(wrapper, input)?;
        document.append_child(wrapper, panel)?;

        let icon = document.create_element("i");
        document.set_class_name(icon, ICON_CLASSES)?;
        document.append_child(wrapper, icon)?;
        document.add_class(input, INPUT_CLASS)?;

        tracing::debug!(widget = %id, input = %input, endpoint, "autocomplete attached");

        let scheduler = QueryScheduler::new(config.min_chars, config.debounce);
        Ok(Self {
            id,
            endpoint: endpoint.to_string(),
            config,
            scaffold: Scaffold {
                input,
                wrapper,
                panel,
                icon,
            },
            scheduler,
            content: PanelContent::Blank,
            visible: false,
            rows: Vec::new(),
            latest_ticket: 0,
            ticket_seq: 0,
        })
    }

    /// Undo `attach`: the input goes back where the wrapper was
    pub(crate) fn detach(self, document: &mut Document) -> Result<()> {
        let Scaffold { input, wrapper, .. } = self.scaffold;
        if let Some(parent) = document.parent(wrapper) {
            document.insert_before(parent, input, wrapper)?;
        } else {
            document.remove(input)?;
        }
        // Panel, icon and rows go with the wrapper
        document.discard(wrapper)?;
        document.remove_class(input, INPUT_CLASS)?;
        tracing::debug!(widget = %self.id, "autocomplete detached");
        Ok(())
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn scaffold(&self) -> Scaffold {
        self.scaffold
    }

    pub fn input(&self) -> NodeId {
        self.scaffold.input
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Current panel state
    pub fn state(&self) -> PanelState {
        if !self.visible {
            return PanelState::Closed;
        }
        match &self.content {
            PanelContent::Blank => PanelState::Closed,
            PanelContent::Loading => PanelState::Loading,
            PanelContent::Empty { query } => PanelState::Empty {
                query: query.clone(),
            },
            PanelContent::Error => PanelState::Error,
            PanelContent::Results { query, results } => PanelState::Results {
                query: query.clone(),
                results: results.clone(),
            },
        }
    }

    /// Deadline of the pending debounced search
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    // ========================================================================
    // Event handlers
    // ========================================================================

    /// `input` listener on the field
    pub(crate) fn on_input(&mut self, document: &mut Document, now: Instant) -> Result<()> {
        let value = document.value(self.scaffold.input)?.to_string();
        match self.scheduler.on_keystroke(&value, now) {
            Keystroke::TooShort => {
                // A response still in flight must not reopen the panel
                self.next_ticket();
                if self.content == PanelContent::Loading {
                    self.content = PanelContent::Blank;
                    self.render(document, Vec::new())?;
                }
                self.hide(document)
            }
            Keystroke::Scheduled { .. } => Ok(()),
        }
    }

    /// `focus` listener on the field
    pub(crate) fn on_focus(&mut self, document: &mut Document) -> Result<()> {
        if !document.children(self.scaffold.panel).is_empty() {
            self.show(document)?;
        }
        Ok(())
    }

    /// Document-level click: close when the click lands outside the wrapper
    pub(crate) fn on_document_click(&mut self, document: &mut Document, target: NodeId) -> Result<()> {
        if !document.contains(self.scaffold.wrapper, target) {
            self.hide(document)?;
        }
        Ok(())
    }

    /// Element of the row that selects result `index`
    pub fn row_element(&self, index: usize) -> Option<NodeId> {
        self.rows
            .iter()
            .find(|(_, i)| *i == index)
            .map(|(row, _)| *row)
    }

    /// Result index of the row containing `target`
    pub(crate) fn row_at(&self, document: &Document, target: NodeId) -> Option<usize> {
        self.rows
            .iter()
            .find(|(row, _)| document.contains(*row, target))
            .map(|(_, index)| *index)
    }

    // ========================================================================
    // Search lifecycle
    // ========================================================================

    /// Fire the debounced search if it is due: render loading and return the
    /// request to execute
    pub(crate) fn poll(&mut self, document: &mut Document, now: Instant) -> Result<Option<SearchRequest>> {
        let Some(query) = self.scheduler.poll(now) else {
            return Ok(None);
        };
        self.search(document, query).map(Some)
    }

    /// Start a search immediately
    pub(crate) fn search(&mut self, document: &mut Document, query: String) -> Result<SearchRequest> {
        let ticket = self.next_ticket();

        self.content = PanelContent::Loading;
        self.render(document, vec![render::loading_row()])?;
        self.show(document)?;

        Ok(SearchRequest {
            widget: self.id,
            ticket,
            endpoint: self.endpoint.clone(),
            param: self.config.query_param.clone(),
            query,
        })
    }

    fn next_ticket(&mut self) -> u64 {
        self.ticket_seq += 1;
        self.latest_ticket = self.ticket_seq;
        self.latest_ticket
    }

    /// Render a finished search.
    ///
    /// Returns `false` when the outcome belongs to a superseded search.
    pub(crate) fn apply(&mut self, document: &mut Document, outcome: SearchOutcome) -> Result<bool> {
        if outcome.ticket != self.latest_ticket {
            tracing::debug!(
                widget = %self.id,
                ticket = outcome.ticket,
                latest = self.latest_ticket,
                "discarding stale search outcome"
            );
            return Ok(false);
        }

        tracing::debug!(
            widget = %self.id,
            ticket = outcome.ticket,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "search settled"
        );
        match outcome.result {
            Ok(results) if results.is_empty() => {
                let row = render::empty_row(&outcome.query);
                self.content = PanelContent::Empty { query: outcome.query };
                self.render(document, vec![row])?;
            }
            Ok(results) => {
                let rows = render::result_rows(&results, &outcome.query, |r, q| {
                    self.config.format_result.format(r, q)
                });
                self.render(document, rows)?;
                self.content = PanelContent::Results {
                    query: outcome.query,
                    results,
                };
            }
            Err(err) => {
                if err.is_recoverable() {
                    tracing::warn!(widget = %self.id, query = %outcome.query, error = %err, "autocomplete search failed");
                } else {
                    tracing::error!(widget = %self.id, query = %outcome.query, error = %err, "autocomplete backend misused");
                }
                self.content = PanelContent::Error;
                self.render(document, vec![render::error_row()])?;
            }
        }

        self.show(document)?;
        Ok(true)
    }

    /// Invoke the selection strategy for result `index`, then close.
    ///
    /// The panel closes even when the strategy fails.
    pub(crate) fn select(&mut self, document: &mut Document, index: usize) -> Result<()> {
        let result = match &self.content {
            PanelContent::Results { results, .. } => results.get(index).cloned(),
            _ => None,
        };

        let selected = match result {
            Some(result) => {
                let mut selection = Selection::new(document, self.scaffold.input);
                self.config.on_select.apply(&result, &mut selection)
            }
            None => Ok(()),
        };
        self.hide(document)?;
        selected
    }

    // ========================================================================
    // Panel
    // ========================================================================

    fn render(&mut self, document: &mut Document, rows: Vec<PanelRow>) -> Result<()> {
        let panel = self.scaffold.panel;
        for old in document.children(panel).to_vec() {
            document.discard(old)?;
        }
        self.rows.clear();

        for row in rows {
            let element = document.create_element("div");
            document.set_class_name(element, &row.classes.join(" "))?;
            document.set_inner_html(element, row.html)?;
            document.append_child(panel, element)?;
            if let Some(index) = row.result {
                self.rows.push((element, index));
            }
        }
        Ok(())
    }

    pub(crate) fn show(&mut self, document: &mut Document) -> Result<()> {
        self.visible = true;
        document.add_class(self.scaffold.panel, SHOW_CLASS)
    }

    /// Hide without clearing content
    pub(crate) fn hide(&mut self, document: &mut Document) -> Result<()> {
        self.visible = false;
        document.remove_class(self.scaffold.panel, SHOW_CLASS)
    }
}
