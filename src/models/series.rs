use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ticker::TickerSymbol;

/// A single daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily closes for one symbol, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: TickerSymbol,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, sorting points by date. Later duplicates of a date win.
    pub fn new(ticker: TickerSymbol, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        points.reverse();
        points.dedup_by_key(|p| p.date);
        points.reverse();
        PriceSeries { ticker, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }
}

/// Indicator values aligned by position with the source price series.
/// `None` marks positions without enough history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub ticker: TickerSymbol,
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    pub sma_fast: Vec<Option<f64>>,
    pub sma_slow: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// Last available value of every indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestIndicators {
    pub close: Option<f64>,
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn latest(&self) -> LatestIndicators {
        fn last(values: &[Option<f64>]) -> Option<f64> {
            values.iter().rev().find_map(|v| *v)
        }
        LatestIndicators {
            close: self.close.last().copied(),
            sma_fast: last(&self.sma_fast),
            sma_slow: last(&self.sma_slow),
            rsi: last(&self.rsi),
            macd: last(&self.macd),
            signal: last(&self.signal),
        }
    }
}

/// Cross-ticker daily returns in percent.
/// `values[t][d]` is the return of `tickers[t]` on `dates[d]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnMatrix {
    pub tickers: Vec<TickerSymbol>,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Vec<f64>>,
}

impl ReturnMatrix {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.tickers.is_empty()
    }

    /// Returns of one ticker across all dates.
    pub fn row(&self, ticker: &TickerSymbol) -> Option<&[f64]> {
        let idx = self.tickers.iter().position(|t| t == ticker)?;
        self.values.get(idx).map(|v| v.as_slice())
    }

    pub fn cell(&self, ticker: &TickerSymbol, date: NaiveDate) -> Option<f64> {
        let col = self.dates.iter().position(|d| *d == date)?;
        self.row(ticker).and_then(|r| r.get(col).copied())
    }

    /// Largest absolute return, used to scale the heatmap colors.
    pub fn max_abs(&self) -> f64 {
        self.values
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold(0.0f64, |acc, v| acc.max(v.abs()))
    }
}
