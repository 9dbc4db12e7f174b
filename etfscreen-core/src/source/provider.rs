//! Screener source trait and the decoded per-tab payload.

use super::observer::FetchObserver;
use crate::error::{ParseError, ScreenerError};
use crate::tab::Tab;
use serde_json::{Map, Value};

/// One row record: column name to cell value.
pub type Record = Map<String, Value>;

/// Decoded payload of a single tab.
#[derive(Debug, Clone, PartialEq)]
pub struct TabPayload {
    pub tab: Tab,
    pub records: Vec<Record>,
}

impl TabPayload {
    /// Pull the row records out of the payload's `data` field.
    pub fn from_value(tab: Tab, value: Value) -> Result<Self, ScreenerError> {
        let parse_err = |message: String| ScreenerError::Parse {
            tab,
            source: ParseError::new(message),
        };

        let Value::Object(mut root) = value else {
            return Err(parse_err("payload is not a JSON object".into()));
        };
        let data = root
            .remove("data")
            .ok_or_else(|| parse_err("payload has no 'data' field".into()))?;
        let Value::Array(rows) = data else {
            return Err(parse_err("'data' field is not an array".into()));
        };

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| match row {
                Value::Object(record) => Ok(record),
                other => Err(parse_err(format!("row {i} is not an object: {other}"))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { tab, records })
    }
}

/// A source of screener tabs.
///
/// The fetch loop above this trait handles ordering and merging; sources only
/// know how to produce one tab.
pub trait ScreenerSource: Send + Sync {
    fn name(&self) -> &str;

    fn fetch_tab(
        &self,
        tab: Tab,
        per_page: u32,
        only: &str,
        observer: &dyn FetchObserver,
    ) -> Result<TabPayload, ScreenerError>;
}
