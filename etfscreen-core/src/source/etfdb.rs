//! etfdb.com screener source.
//!
//! Each tab is one POST of `{per_page, only, tab}` to the screener endpoint.
//! Transport failures and non-success statuses are retried according to the
//! configured [`RetryPolicy`]; the body is decoded with [`lenient_decode`].

use super::decode::lenient_decode;
use super::observer::{AttemptOutcome, FetchObserver};
use super::provider::{ScreenerSource, TabPayload};
use super::retry::RetryPolicy;
use super::transport::{HttpTransport, Transport};
use crate::error::{ScreenerError, TransportError};
use crate::tab::Tab;
use serde_json::{json, Value};

pub const DEFAULT_ENDPOINT: &str = "https://etfdb.com/api/screener/";

/// Request body for one tab.
pub fn tab_request_body(tab: Tab, per_page: u32, only: &str) -> Value {
    json!({ "per_page": per_page, "only": only, "tab": tab.as_str() })
}

pub struct EtfDbSource<T: Transport = HttpTransport> {
    transport: T,
    endpoint: String,
    retry: RetryPolicy,
}

impl EtfDbSource<HttpTransport> {
    /// Source against the public endpoint with the default backoff policy.
    pub fn new() -> Result<Self, ScreenerError> {
        Ok(Self::with_transport(HttpTransport::new()?))
    }
}

impl<T: Transport> EtfDbSource<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// POST until a success status arrives or the policy gives up.
    fn post_with_retry(
        &self,
        tab: Tab,
        body: &Value,
        observer: &dyn FetchObserver,
    ) -> Result<String, ScreenerError> {
        let mut rng = rand::thread_rng();
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);

            let (outcome, last_error) = match self.transport.post_json(&self.endpoint, body) {
                Ok(reply) if reply.is_success() => {
                    observer.on_attempt(tab, attempt, &AttemptOutcome::Success);
                    return Ok(reply.body);
                }
                Ok(reply) => (
                    AttemptOutcome::Status(reply.status),
                    format!("HTTP {}", reply.status),
                ),
                Err(TransportError(e)) => (AttemptOutcome::Transport(e.clone()), e),
            };
            observer.on_attempt(tab, attempt, &outcome);

            if !self.retry.allows_another(attempt) {
                return Err(ScreenerError::RetriesExhausted {
                    tab,
                    attempts: attempt,
                    last_error,
                });
            }

            let delay = self.retry.delay(attempt, &mut rng);
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }
    }
}

impl<T: Transport> ScreenerSource for EtfDbSource<T> {
    fn name(&self) -> &str {
        "etfdb"
    }

    fn fetch_tab(
        &self,
        tab: Tab,
        per_page: u32,
        only: &str,
        observer: &dyn FetchObserver,
    ) -> Result<TabPayload, ScreenerError> {
        let body = tab_request_body(tab, per_page, only);
        let text = self.post_with_retry(tab, &body, observer)?;
        let value = lenient_decode(&text).map_err(|source| ScreenerError::Parse { tab, source })?;
        TabPayload::from_value(tab, value)
    }
}
