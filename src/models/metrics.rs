use serde::{Deserialize, Serialize};

use super::info::InfoRecord;
use super::ticker::TickerSymbol;

/// Column headers of the metrics table, shared by every export format.
pub const METRICS_COLUMNS: [&str; 7] = [
    "Ticker",
    "Name",
    "Price",
    "Market Cap",
    "52w High",
    "52w Low",
    "PE Ratio",
];

/// One row of the metrics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub ticker: TickerSymbol,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub high_52w: Option<f64>,
    pub low_52w: Option<f64>,
    pub trailing_pe: Option<f64>,
}

impl MetricsRow {
    pub fn new(ticker: TickerSymbol, info: InfoRecord) -> Self {
        MetricsRow {
            ticker,
            name: info.name,
            price: info.price,
            market_cap: info.market_cap,
            high_52w: info.high_52w,
            low_52w: info.low_52w,
            trailing_pe: info.trailing_pe,
        }
    }

    /// Numeric cells in column order (everything after Ticker and Name).
    pub fn numeric_cells(&self) -> [Option<f64>; 5] {
        [
            self.price,
            self.market_cap,
            self.high_52w,
            self.low_52w,
            self.trailing_pe,
        ]
    }
}

/// Metrics rows in input ticker order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsTable {
    rows: Vec<MetricsRow>,
}

impl MetricsTable {
    pub fn new(rows: Vec<MetricsRow>) -> Self {
        MetricsTable { rows }
    }

    pub fn rows(&self) -> &[MetricsRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Cross-ticker averages shown above the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub avg_price: Option<f64>,
    pub avg_market_cap: Option<f64>,
    pub avg_pe: Option<f64>,
}

/// Which fetch failed for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStage {
    Info,
    Prices,
}

/// A per-symbol fetch error surfaced to the caller as a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub ticker: TickerSymbol,
    pub stage: FetchStage,
    pub message: String,
}

/// Output of the snapshot aggregator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub table: MetricsTable,
    pub summary: Summary,
    pub failures: Vec<FetchFailure>,
}
