//! Structured error types for the screener pipeline.
//!
//! Retryable failures (transport errors, non-success statuses) never surface
//! while the retry policy allows another attempt; they only appear wrapped in
//! `RetriesExhausted` once a bounded policy gives up.

use crate::tab::Tab;
use thiserror::Error;

/// Payload text that could not be decoded, even after the lenient repair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A connection-level failure: the request never produced an HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[derive(Debug, Error)]
pub enum ScreenerError {
    #[error("unknown screener tab '{0}'")]
    UnknownTab(String),

    /// The HTTP client itself could not be set up.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("gave up on tab '{tab}' after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        tab: Tab,
        attempts: u32,
        last_error: String,
    },

    #[error("malformed payload for tab '{tab}': {source}")]
    Parse {
        tab: Tab,
        #[source]
        source: ParseError,
    },

    #[error("expected column '{column}' is missing (upstream schema changed?)")]
    Structural { column: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
