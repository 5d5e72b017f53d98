//! Search execution
//!
//! Runs backend lookups off the UI thread and hands the outcomes back over a
//! channel. The page drains the channel from its own loop, so widgets and the
//! document are only ever touched by the thread that owns them.

use crate::client::{SearchBackend, SearchResult};
use crate::error::Result;
use crate::page::WidgetId;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How searches are run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    /// One worker thread per search
    #[default]
    Background,
    /// Run on the calling thread; the outcome is still queued
    Inline,
}

/// A search ready to be sent to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub widget: WidgetId,
    /// Monotonic per widget; identifies the latest search
    pub ticket: u64,
    pub endpoint: String,
    pub param: String,
    pub query: String,
}

/// Result of one search
#[derive(Debug)]
pub struct SearchOutcome {
    pub widget: WidgetId,
    pub ticket: u64,
    pub query: String,
    pub result: Result<Vec<SearchResult>>,
    pub elapsed: Duration,
}

/// Runs searches and collects their outcomes
pub struct SearchExecutor {
    backend: Arc<dyn SearchBackend>,
    dispatch: Dispatch,
    sender: Sender<SearchOutcome>,
    receiver: Receiver<SearchOutcome>,
}

impl SearchExecutor {
    pub fn new(backend: Arc<dyn SearchBackend>, dispatch: Dispatch) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            backend,
            dispatch,
            sender,
            receiver,
        }
    }

    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    /// Start a search
    pub fn submit(&self, request: SearchRequest) {
        tracing::debug!(
            widget = %request.widget,
            ticket = request.ticket,
            query = %request.query,
            "search dispatched"
        );

        match self.dispatch {
            Dispatch::Inline => run(self.backend.as_ref(), request, &self.sender),
            Dispatch::Background => {
                let backend = Arc::clone(&self.backend);
                let sender = self.sender.clone();
                thread::spawn(move || run(backend.as_ref(), request, &sender));
            }
        }
    }

    /// Outcomes that have already arrived
    pub fn drain(&self) -> Vec<SearchOutcome> {
        self.receiver.try_iter().collect()
    }

    /// Block until an outcome arrives or `timeout` passes
    pub fn wait(&self, timeout: Duration) -> Option<SearchOutcome> {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

fn run(backend: &dyn SearchBackend, request: SearchRequest, sender: &Sender<SearchOutcome>) {
    let start = Instant::now();
    let result = backend
        .search(&request.endpoint, &request.param, &request.query)
        .map(|response| response.results);

    // The page may already be gone
    let _ = sender.send(SearchOutcome {
        widget: request.widget,
        ticket: request.ticket,
        query: request.query,
        result,
        elapsed: start.elapsed(),
    });
}
