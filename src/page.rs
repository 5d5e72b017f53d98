//! Page: document, widget registry and event dispatch
//!
//! A single document-level dispatcher routes events to the widgets in the
//! registry. Detaching a widget removes it from the registry, which is all it
//! takes to drop its listeners.

use crate::client::SearchBackend;
use crate::config::WidgetConfig;
use crate::dom::{Document, NodeId};
use crate::error::{Result, TypeaheadError};
use crate::executor::{Dispatch, SearchExecutor, SearchOutcome};
use crate::widget::{Autocomplete, PanelState};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Handle to an attached widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u64);

impl WidgetId {
    pub fn from_raw(raw: u64) -> Self {
        WidgetId(raw)
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Events the host delivers to the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    /// The value of `target` changed
    Input { target: NodeId },
    Focus { target: NodeId },
    Click { target: NodeId },
}

/// A document plus the widgets attached to it
pub struct Page {
    document: Document,
    widgets: BTreeMap<WidgetId, Autocomplete>,
    executor: SearchExecutor,
    next_id: u64,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("widgets", &self.widgets.keys().collect::<Vec<_>>())
            .field("dispatch", &self.executor.dispatch())
            .finish()
    }
}

impl Page {
    /// New empty page whose searches run on background threads
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self::with_dispatch(backend, Dispatch::Background)
    }

    pub fn with_dispatch(backend: Arc<dyn SearchBackend>, dispatch: Dispatch) -> Self {
        Self::with_document(Document::new(), backend, dispatch)
    }

    pub fn with_document(document: Document, backend: Arc<dyn SearchBackend>, dispatch: Dispatch) -> Self {
        Self {
            document,
            widgets: BTreeMap::new(),
            executor: SearchExecutor::new(backend, dispatch),
            next_id: 1,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Attach a widget to `input`
    pub fn attach(&mut self, input: NodeId, endpoint: &str, config: WidgetConfig) -> Result<WidgetId> {
        self.document.get(input)?;
        if self.widget_for_input(input).is_some() {
            return Err(TypeaheadError::AlreadyAttached(input));
        }
        if let Some(owner) = self
            .widgets
            .values()
            .find(|w| self.document.contains(w.scaffold().wrapper, input))
        {
            return Err(TypeaheadError::NestedWidget(input, owner.id()));
        }

        let id = WidgetId(self.next_id);
        let widget = Autocomplete::attach(&mut self.document, id, input, endpoint, config)?;
        self.next_id += 1;
        self.widgets.insert(id, widget);
        Ok(id)
    }

    /// Remove a widget and restore its input
    pub fn detach(&mut self, id: WidgetId) -> Result<()> {
        let widget = self
            .widgets
            .remove(&id)
            .ok_or(TypeaheadError::NoSuchWidget(id))?;
        widget.detach(&mut self.document)
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Autocomplete> {
        self.widgets.get(&id)
    }

    pub fn widgets(&self) -> impl Iterator<Item = &Autocomplete> {
        self.widgets.values()
    }

    /// Panel state of widget `id`
    pub fn state(&self, id: WidgetId) -> Result<PanelState> {
        self.widget(id)
            .map(Autocomplete::state)
            .ok_or(TypeaheadError::NoSuchWidget(id))
    }

    fn widget_for_input(&self, input: NodeId) -> Option<WidgetId> {
        self.widgets
            .values()
            .find(|w| w.input() == input)
            .map(Autocomplete::id)
    }

    fn widget_mut(&mut self, id: WidgetId) -> Result<&mut Autocomplete> {
        self.widgets.get_mut(&id).ok_or(TypeaheadError::NoSuchWidget(id))
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Deliver an event
    pub fn dispatch(&mut self, event: DomEvent, now: Instant) -> Result<()> {
        match event {
            DomEvent::Input { target } => {
                if let Some(id) = self.widget_for_input(target) {
                    let document = &mut self.document;
                    if let Some(widget) = self.widgets.get_mut(&id) {
                        widget.on_input(document, now)?;
                    }
                }
            }
            DomEvent::Focus { target } => {
                if let Some(id) = self.widget_for_input(target) {
                    let document = &mut self.document;
                    if let Some(widget) = self.widgets.get_mut(&id) {
                        widget.on_focus(document)?;
                    }
                }
            }
            DomEvent::Click { target } => self.click(target)?,
        }
        Ok(())
    }

    fn click(&mut self, target: NodeId) -> Result<()> {
        let document = &mut self.document;

        // Row handlers run before the click reaches the document; a failing
        // selection still lets every other widget see the click
        let mut selected = Ok(());
        for widget in self.widgets.values_mut() {
            if let Some(index) = widget.row_at(document, target) {
                let outcome = widget.select(document, index);
                if selected.is_ok() {
                    selected = outcome;
                }
            }
        }

        for widget in self.widgets.values_mut() {
            widget.on_document_click(document, target)?;
        }
        selected
    }

    /// Set the value of `input` and fire its `input` event
    pub fn type_into(&mut self, input: NodeId, value: &str, now: Instant) -> Result<()> {
        self.document.set_value(input, value)?;
        self.dispatch(DomEvent::Input { target: input }, now)
    }

    /// Click the `index`-th selectable row of widget `id`
    pub fn click_result(&mut self, id: WidgetId, index: usize) -> Result<()> {
        let row = self.widget_mut(id)?.row_element(index);
        match row {
            Some(row) => self.click(row),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Earliest pending debounce deadline across all widgets
    pub fn next_deadline(&self) -> Option<Instant> {
        self.widgets.values().filter_map(Autocomplete::next_deadline).min()
    }

    /// Start every search whose debounce deadline has passed.
    ///
    /// Returns the number of searches started.
    pub fn fire_due(&mut self, now: Instant) -> Result<usize> {
        let mut fired = 0;
        for widget in self.widgets.values_mut() {
            if let Some(request) = widget.poll(&mut self.document, now)? {
                self.executor.submit(request);
                fired += 1;
            }
        }
        Ok(fired)
    }

    /// Render outcomes that have arrived. Returns how many were rendered.
    pub fn pump(&mut self) -> Result<usize> {
        let mut applied = 0;
        for outcome in self.executor.drain() {
            if self.apply(outcome)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// `fire_due` then `pump`
    pub fn advance(&mut self, now: Instant) -> Result<usize> {
        self.fire_due(now)?;
        self.pump()
    }

    /// Block for the next outcome and render it.
    ///
    /// Returns `Ok(false)` on timeout or when the outcome was stale.
    pub fn wait_for_outcome(&mut self, timeout: Duration) -> Result<bool> {
        match self.executor.wait(timeout) {
            Some(outcome) => self.apply(outcome),
            None => Ok(false),
        }
    }

    fn apply(&mut self, outcome: SearchOutcome) -> Result<bool> {
        let document = &mut self.document;
        match self.widgets.get_mut(&outcome.widget) {
            Some(widget) => widget.apply(document, outcome),
            // Widget detached while its search was in flight
            None => Ok(false),
        }
    }
}
