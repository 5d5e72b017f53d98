//! Error types for typeahead
//!
//! Search failures are rendered into the panel; misuse of the binder fails fast.

use crate::dom::NodeId;
use crate::page::WidgetId;
use thiserror::Error;

/// Main error type for typeahead operations
#[derive(Error, Debug)]
pub enum TypeaheadError {
    #[error("Input {0} already has an autocomplete widget attached")]
    AlreadyAttached(NodeId),

    #[error("Input {0} is nested inside the wrapper of widget {1}")]
    NestedWidget(NodeId, WidgetId),

    #[error("Node {0} has no parent; attach it to the document first")]
    NotAttachedToTree(NodeId),

    #[error("Cannot insert into {0}: the node would contain its own ancestor")]
    HierarchyRequest(NodeId),

    #[error("No such node: {0}")]
    NoSuchNode(NodeId),

    #[error("No such widget: {0}")]
    NoSuchWidget(WidgetId),

    #[error("Search endpoint returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed search response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid log filter '{0}': {1}")]
    LogFilter(String, String),

    #[error("Logging already initialised: {0}")]
    LoggingInit(String),
}

/// Result type alias for typeahead operations
pub type Result<T> = std::result::Result<T, TypeaheadError>;

impl TypeaheadError {
    /// Check if this error is recoverable (the widget renders it and keeps going)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TypeaheadError::HttpStatus(_)
                | TypeaheadError::Transport(_)
                | TypeaheadError::Decode(_)
                | TypeaheadError::IoError(_)
        )
    }
}

impl From<ureq::Error> for TypeaheadError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => TypeaheadError::HttpStatus(code),
            ureq::Error::Transport(transport) => TypeaheadError::Transport(transport.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_failures_are_recoverable() {
        assert!(TypeaheadError::HttpStatus(500).is_recoverable());
        assert!(TypeaheadError::Transport("refused".into()).is_recoverable());
        let decode = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        assert!(TypeaheadError::from(decode).is_recoverable());
    }

    #[test]
    fn misuse_is_not_recoverable() {
        assert!(!TypeaheadError::AlreadyAttached(NodeId::from_raw(3)).is_recoverable());
        assert!(!TypeaheadError::NoSuchWidget(WidgetId::from_raw(1)).is_recoverable());
    }

    #[test]
    fn messages_name_the_node() {
        let err = TypeaheadError::AlreadyAttached(NodeId::from_raw(7));
        assert_eq!(
            err.to_string(),
            "Input #7 already has an autocomplete widget attached"
        );
    }
}
