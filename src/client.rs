//! Search endpoint client
//!
//! Wire contract: `GET <endpoint>?q=<percent-encoded query>` answering
//! `{ "results": [ { "name": ..., "sku"?: ..., "email"?: ..., "url"?: ... } ] }`.

use crate::error::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;

/// One record returned by the search endpoint.
///
/// Only `name`, `sku`, `email` and `url` are interpreted; everything else is
/// kept in `extra` and passed through to formatters and selection strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sku: None,
            email: None,
            url: None,
            extra: Map::new(),
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Secondary line: sku, else email, else empty
    pub fn secondary_text(&self) -> &str {
        [&self.sku, &self.email]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }

    /// Navigation target, ignoring empty strings
    pub fn navigation_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

/// Response body of the search endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

impl SearchResponse {
    /// Decode a response body
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

/// Something that can answer a search query.
///
/// Implementations are called from worker threads.
pub trait SearchBackend: Send + Sync {
    fn search(&self, endpoint: &str, param: &str, query: &str) -> Result<SearchResponse>;
}

// ============================================================================
// HTTP backend
// ============================================================================

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking HTTP backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    agent: ureq::Agent,
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpBackend {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl SearchBackend for HttpBackend {
    fn search(&self, endpoint: &str, param: &str, query: &str) -> Result<SearchResponse> {
        let response = self
            .agent
            .get(endpoint)
            .set("Accept", "application/json")
            .query(param, query)
            .call()?;
        let body = response.into_string()?;
        SearchResponse::from_json(&body)
    }
}

// ============================================================================
// Catalog backend
// ============================================================================

/// Queries shorter than this return nothing
pub const CATALOG_MIN_QUERY_CHARS: usize = 2;
/// Most results a catalog search returns
pub const CATALOG_MAX_RESULTS: usize = 10;

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped(SearchResponse),
    Bare(Vec<SearchResult>),
}

/// In-memory record list answering the same way the product endpoint does:
/// case-insensitive substring match on name or sku, capped result count.
#[derive(Debug, Default)]
pub struct CatalogBackend {
    records: RwLock<Vec<SearchResult>>,
}

impl CatalogBackend {
    pub fn new(records: Vec<SearchResult>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Load records from a JSON file holding either `{ "results": [...] }`
    /// or a bare array
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let records = match serde_json::from_str::<CatalogFile>(&text)? {
            CatalogFile::Wrapped(response) => response.results,
            CatalogFile::Bare(records) => records,
        };
        tracing::debug!(path = %path.display(), count = records.len(), "catalog loaded");
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn insert(&self, record: SearchResult) {
        self.records.write().push(record);
    }

    /// Matching records in catalog order
    pub fn lookup(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.chars().count() < CATALOG_MIN_QUERY_CHARS {
            return Vec::new();
        }

        let needle = query.to_lowercase();
        self.records
            .read()
            .iter()
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.sku.as_deref().is_some_and(|s| s.to_lowercase().contains(&needle))
            })
            .take(CATALOG_MAX_RESULTS)
            .cloned()
            .collect()
    }
}

impl SearchBackend for CatalogBackend {
    fn search(&self, _endpoint: &str, _param: &str, query: &str) -> Result<SearchResponse> {
        Ok(SearchResponse {
            results: self.lookup(query),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypeaheadError;
    use crossbeam_channel::Receiver;
    use pretty_assertions::assert_eq;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one HTTP response on a local port; the receiver yields the
    /// request line the client sent
    fn serve_once(status: &str, content_type: &str, body: &str) -> (String, Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/products/autocomplete/", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = crossbeam_channel::bounded(1);

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let text = String::from_utf8_lossy(&request).into_owned();
            let line = text.lines().next().unwrap_or_default().to_string();
            stream.write_all(response.as_bytes()).unwrap();
            tx.send(line).unwrap();
        });

        (url, rx)
    }

    #[test]
    fn http_sends_the_query_percent_encoded() {
        let (url, request) = serve_once(
            "200 OK",
            "application/json",
            r#"{"results":[{"name":"Mouse Gamer","sku":"MOUSE-001"}]}"#,
        );

        let response = HttpBackend::default().search(&url, "q", "a b&c").unwrap();

        assert_eq!(
            request.recv().unwrap(),
            "GET /products/autocomplete/?q=a+b%26c HTTP/1.1"
        );
        assert_eq!(
            response.results,
            vec![SearchResult::new("Mouse Gamer").with_sku("MOUSE-001")]
        );
    }

    #[test]
    fn http_error_status_is_reported() {
        let (url, _request) = serve_once("500 Internal Server Error", "text/plain", "oops");
        let err = HttpBackend::default().search(&url, "q", "mouse").unwrap_err();
        assert!(matches!(err, TypeaheadError::HttpStatus(500)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn http_html_body_is_a_decode_error() {
        let (url, _request) = serve_once("200 OK", "text/html", "<!doctype html><p>login</p>");
        let err = HttpBackend::default().search(&url, "q", "mouse").unwrap_err();
        assert!(matches!(err, TypeaheadError::Decode(_)));
    }

    #[test]
    fn http_body_without_results_is_a_decode_error() {
        let (url, _request) = serve_once("200 OK", "application/json", r#"{"items":[]}"#);
        let err = HttpBackend::default().search(&url, "q", "mouse").unwrap_err();
        assert!(matches!(err, TypeaheadError::Decode(_)));
    }

    #[test]
    fn http_refused_connection_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let err = HttpBackend::new(Duration::from_secs(2))
            .search(&url, "q", "mouse")
            .unwrap_err();
        assert!(matches!(err, TypeaheadError::Transport(_)));
    }

    fn catalog() -> CatalogBackend {
        CatalogBackend::new(vec![
            SearchResult::new("Mouse Gamer").with_sku("MOUSE-001"),
            SearchResult::new("Teclado Mecânico").with_sku("TECL-001"),
        ])
    }

    #[test]
    fn decodes_passthrough_fields() {
        let body = r#"{"results":[{"name":"Widget A","sku":"W1","price":"9.90","stock":3}]}"#;
        let response = SearchResponse::from_json(body).unwrap();
        let result = &response.results[0];

        assert_eq!(result.name, "Widget A");
        assert_eq!(result.sku.as_deref(), Some("W1"));
        assert_eq!(result.extra.get("price"), Some(&Value::from("9.90")));
        assert_eq!(result.extra.get("stock"), Some(&Value::from(3)));
    }

    #[test]
    fn rejects_bodies_without_results() {
        assert!(SearchResponse::from_json("{}").is_err());
        assert!(SearchResponse::from_json("<!doctype html>").is_err());
    }

    #[test]
    fn secondary_text_prefers_non_empty_sku() {
        let sku = SearchResult::new("a").with_sku("S").with_email("e@x");
        let email = SearchResult::new("b").with_sku("").with_email("e@x");
        let neither = SearchResult::new("c");

        assert_eq!(sku.secondary_text(), "S");
        assert_eq!(email.secondary_text(), "e@x");
        assert_eq!(neither.secondary_text(), "");
    }

    #[test]
    fn catalog_matches_name_and_sku_case_insensitively() {
        let catalog = catalog();
        let names = |q: &str| {
            catalog
                .lookup(q)
                .into_iter()
                .map(|r| r.name)
                .collect::<Vec<_>>()
        };

        assert_eq!(names("MOUSE"), vec!["Mouse Gamer"]);
        assert_eq!(names("mouse"), vec!["Mouse Gamer"]);
        assert_eq!(names("tecl"), vec!["Teclado Mecânico"]);
        assert!(names("m").is_empty());
    }

    #[test]
    fn catalog_caps_result_count() {
        let catalog = CatalogBackend::default();
        for i in 0..15 {
            catalog.insert(SearchResult::new(format!("Produto Teste {i}")));
        }
        assert_eq!(catalog.lookup("teste").len(), CATALOG_MAX_RESULTS);
    }

    #[test]
    fn catalog_loads_wrapped_and_bare_files() {
        let mut wrapped = tempfile::NamedTempFile::new().unwrap();
        write!(wrapped, r#"{{"results":[{{"name":"Mouse Gamer"}}]}}"#).unwrap();
        let mut bare = tempfile::NamedTempFile::new().unwrap();
        write!(bare, r#"[{{"name":"Mouse Gamer"}},{{"name":"Mousepad"}}]"#).unwrap();

        assert_eq!(CatalogBackend::load(wrapped.path()).unwrap().len(), 1);
        assert_eq!(CatalogBackend::load(bare.path()).unwrap().len(), 2);
    }
}
