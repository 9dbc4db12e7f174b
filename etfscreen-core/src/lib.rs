//! etfscreen core — ETF screener retrieval and cleaning.
//!
//! This crate contains:
//! - Screener tabs and the per-tab fetcher with a pluggable retry policy
//! - Lenient decoding of single-quoted payloads
//! - Raw table assembly: tabs merged on row identity with outer-join semantics
//! - The cleaning pipeline producing a typed polars DataFrame
//! - Output writers (CSV, Parquet, JSON)
//!
//! Logging is never configured here; pass a [`source::FetchObserver`].

pub mod config;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod tab;
pub mod table;

pub use config::{ScreenerConfig, ScreenerRequest};
pub use error::{ParseError, ScreenerError, TransportError};
pub use pipeline::{download_clean_public_data, fetch_raw_table};
pub use tab::Tab;
pub use table::{clean_table, CleanOptions, RawTable};
