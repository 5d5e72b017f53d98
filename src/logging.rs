//! Logging setup
//!
//! Library code emits `tracing` events; binaries call [`init`] once to route
//! them to stderr or to a log file that starts fresh on each run.

use crate::error::{Result, TypeaheadError};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Default filter when none is given
pub const DEFAULT_LEVEL: &str = "warn";

/// Parse a level or filter directive (`debug`, `typeahead=trace,warn`, ...)
pub fn filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| TypeaheadError::LogFilter(directive.to_string(), e.to_string()))
}

/// Install the global subscriber.
///
/// With `log_file` set, output goes to that file (truncated first) without
/// ANSI colours; otherwise to stderr.
pub fn init(directive: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = filter(directive)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true) // Start fresh each run
                .open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| TypeaheadError::LoggingInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_levels_and_directives() {
        assert!(filter("debug").is_ok());
        assert!(filter("typeahead=trace,warn").is_ok());
    }

    #[test]
    fn rejects_garbage_directives() {
        let err = filter("typeahead=loud").unwrap_err();
        assert!(matches!(err, TypeaheadError::LogFilter(d, _) if d == "typeahead=loud"));
    }
}
