//! Screener retrieval: transport, retry, lenient decoding, observers.

pub mod decode;
pub mod etfdb;
pub mod observer;
pub mod provider;
pub mod retry;
pub mod transport;

pub use decode::{lenient_decode, repair_quotes, REPAIR_RULES};
pub use etfdb::{tab_request_body, EtfDbSource, DEFAULT_ENDPOINT};
pub use observer::{AttemptOutcome, FetchObserver, NoopObserver, TracingObserver};
pub use provider::{Record, ScreenerSource, TabPayload};
pub use retry::RetryPolicy;
pub use transport::{HttpReply, HttpTransport, Transport};
