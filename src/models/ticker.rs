use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Default watchlist shown when the user has not typed anything yet.
pub const DEFAULT_TICKERS: &str = "AAPL, MSFT, GOOGL, AMZN, TSLA";

/// A normalized (trimmed, upper-cased) ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TickerSymbol(String);

impl TickerSymbol {
    /// Normalize a raw symbol. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(TickerSymbol(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TickerSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TickerSymbol {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TickerSymbol::parse(s).ok_or_else(|| AppError::InvalidTicker(s.to_string()))
    }
}

impl TryFrom<String> for TickerSymbol {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TickerSymbol> for String {
    fn from(symbol: TickerSymbol) -> Self {
        symbol.0
    }
}

/// Split comma-separated user input into symbols, keeping input order.
/// Blank entries are skipped and repeated symbols keep their first position.
pub fn parse_watchlist(input: &str) -> Vec<TickerSymbol> {
    let mut seen = HashSet::new();
    input
        .split(',')
        .filter_map(TickerSymbol::parse)
        .filter(|symbol| seen.insert(symbol.clone()))
        .collect()
}
