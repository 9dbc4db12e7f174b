//! Observability callbacks for a fetch session.
//!
//! The library never installs a global logger; callers pass an observer. The
//! tracing-backed one is what the CLI uses.

use crate::error::ScreenerError;
use crate::tab::Tab;

/// Outcome of a single request attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    /// The server answered with a non-success status.
    Status(u16),
    /// No response was received.
    Transport(String),
}

pub trait FetchObserver: Send + Sync {
    /// Called after every request attempt, successful or not.
    fn on_attempt(&self, tab: Tab, attempt: u32, outcome: &AttemptOutcome);

    /// Called once a tab's payload has been decoded.
    fn on_tab_complete(&self, _tab: Tab, _rows: usize) {}

    /// Called by the catch-all entry point before it returns an empty table.
    fn on_pipeline_error(&self, _error: &ScreenerError) {}
}

/// Emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl FetchObserver for TracingObserver {
    fn on_attempt(&self, tab: Tab, attempt: u32, outcome: &AttemptOutcome) {
        match outcome {
            AttemptOutcome::Success => {
                tracing::info!(%tab, attempt, "tab downloaded successfully")
            }
            AttemptOutcome::Status(status) => {
                tracing::warn!(%tab, attempt, status, "non-success status, trying again")
            }
            AttemptOutcome::Transport(error) => {
                tracing::warn!(%tab, attempt, %error, "connection error, trying again")
            }
        }
    }

    fn on_tab_complete(&self, tab: Tab, rows: usize) {
        tracing::debug!(%tab, rows, "tab decoded");
    }

    fn on_pipeline_error(&self, error: &ScreenerError) {
        tracing::error!(%error, "screener pipeline failed, returning empty table");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FetchObserver for NoopObserver {
    fn on_attempt(&self, _tab: Tab, _attempt: u32, _outcome: &AttemptOutcome) {}
}
