//! Screener tabs — the independently fetched column groups of the ETF screener.

use crate::error::ScreenerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named group of related fields offered by the screener.
///
/// Variants are listed in the order the screener presents them; the default
/// request fetches them in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    Overview,
    Returns,
    FundFlows,
    Expenses,
    Esg,
    Dividends,
    Risk,
    Holdings,
    Taxes,
    Technicals,
    Analysis,
    RealtimeRatings,
}

impl Tab {
    pub const ALL: [Tab; 12] = [
        Tab::Overview,
        Tab::Returns,
        Tab::FundFlows,
        Tab::Expenses,
        Tab::Esg,
        Tab::Dividends,
        Tab::Risk,
        Tab::Holdings,
        Tab::Taxes,
        Tab::Technicals,
        Tab::Analysis,
        Tab::RealtimeRatings,
    ];

    /// Name the screener API expects in the `tab` request field.
    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Overview => "overview",
            Tab::Returns => "returns",
            Tab::FundFlows => "fund-flows",
            Tab::Expenses => "expenses",
            Tab::Esg => "esg",
            Tab::Dividends => "dividends",
            Tab::Risk => "risk",
            Tab::Holdings => "holdings",
            Tab::Taxes => "taxes",
            Tab::Technicals => "technicals",
            Tab::Analysis => "analysis",
            Tab::RealtimeRatings => "realtime-ratings",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Tab::ALL
            .iter()
            .copied()
            .find(|tab| tab.as_str() == wanted)
            .ok_or_else(|| ScreenerError::UnknownTab(s.to_string()))
    }
}
