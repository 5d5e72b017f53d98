//! typeahead - headless type-ahead search widget
//!
//! Attaches to a text input, debounces keystrokes, queries a remote search
//! endpoint and renders the candidates into a dropdown panel the user can
//! pick from.
//!
//! # Features
//!
//! - **Debounced lookups**: one request per pause in typing, never below the
//!   minimum query length
//! - **Stale-response guard**: only the most recent search may render
//! - **Safe highlighting**: query text is matched literally and all
//!   untrusted text is HTML-escaped
//! - **Pluggable behaviour**: row formatter and selection strategy are
//!   configurable; backends are a trait (HTTP or in-memory catalog)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//! use typeahead::{HttpBackend, Page, PanelState, WidgetConfig};
//!
//! fn main() -> typeahead::Result<()> {
//!     let mut page = Page::new(Arc::new(HttpBackend::default()));
//!     let body = page.document().body();
//!     let input = page.document_mut().create_element("input");
//!     page.document_mut().append_child(body, input)?;
//!
//!     let widget = page.attach(
//!         input,
//!         "http://localhost:8000/products/autocomplete/",
//!         WidgetConfig::default(),
//!     )?;
//!
//!     let now = Instant::now();
//!     page.type_into(input, "mouse", now)?;
//!     page.fire_due(now + Duration::from_millis(300))?;
//!     page.wait_for_outcome(Duration::from_secs(5))?;
//!
//!     if let PanelState::Results { results, .. } = page.state(widget)? {
//!         for result in results {
//!             println!("{} {}", result.name, result.secondary_text());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod dom;
pub mod error;
pub mod executor;
pub mod logging;
pub mod page;
pub mod render;
pub mod scheduler;
pub mod widget;

// Re-export main types
pub use client::{CatalogBackend, HttpBackend, SearchBackend, SearchResponse, SearchResult};
pub use config::{FormatResult, OnSelect, Selection, WidgetConfig, WidgetOptions};
pub use dom::{Document, NodeId};
pub use error::{Result, TypeaheadError};
pub use executor::Dispatch;
pub use page::{DomEvent, Page, WidgetId};
pub use widget::{Autocomplete, PanelState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
