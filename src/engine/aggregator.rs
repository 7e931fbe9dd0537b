use tracing::warn;

use crate::errors::AppError;
use crate::models::info::InfoRecord;
use crate::models::metrics::{
    FetchFailure, FetchStage, MetricsRow, MetricsTable, Snapshot, Summary,
};
use crate::models::ticker::TickerSymbol;

/// Build the snapshot from already fetched outcomes, kept in the given order.
///
/// A failed fetch is recorded and skipped; the rest of the batch goes on.
pub fn assemble(outcomes: Vec<(TickerSymbol, Result<InfoRecord, AppError>)>) -> Snapshot {
    let mut rows = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();

    for (ticker, outcome) in outcomes {
        match outcome {
            Ok(info) => rows.push(MetricsRow::new(ticker, info)),
            Err(e) => {
                warn!("Error fetching {}: {}", ticker, e);
                failures.push(FetchFailure {
                    ticker,
                    stage: FetchStage::Info,
                    message: e.to_string(),
                });
            }
        }
    }

    let table = MetricsTable::new(rows);
    let summary = summarize(&table);
    Snapshot {
        table,
        summary,
        failures,
    }
}

/// Cross-ticker averages. Each field averages only the rows where it is
/// present, so every field has its own denominator.
pub fn summarize(table: &MetricsTable) -> Summary {
    Summary {
        avg_price: mean_present(table.rows().iter().map(|r| r.price)),
        avg_market_cap: mean_present(table.rows().iter().map(|r| r.market_cap)),
        avg_pe: mean_present(table.rows().iter().map(|r| r.trailing_pe)),
    }
}

fn mean_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = values.flatten().filter(|v| v.is_finite()).collect();
    if present.is_empty() {
        return None;
    }
    Some(present.iter().sum::<f64>() / present.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> TickerSymbol {
        TickerSymbol::parse(s).unwrap()
    }

    fn info(price: Option<f64>, cap: Option<f64>, pe: Option<f64>) -> InfoRecord {
        InfoRecord {
            name: Some("Test Corp".into()),
            price,
            market_cap: cap,
            trailing_pe: pe,
            ..Default::default()
        }
    }

    #[test]
    fn test_failed_symbol_is_skipped() {
        let snapshot = assemble(vec![
            (sym("A"), Ok(info(Some(10.0), None, None))),
            (sym("B"), Err(AppError::UnknownSymbol("B".into()))),
            (sym("C"), Ok(info(Some(10.0), None, None))),
        ]);

        let tickers: Vec<&str> = snapshot
            .table
            .rows()
            .iter()
            .map(|r| r.ticker.as_str())
            .collect();
        assert_eq!(tickers, vec!["A", "C"]);
        assert_eq!(snapshot.failures.len(), 1);
        assert_eq!(snapshot.failures[0].ticker, sym("B"));
        assert_eq!(snapshot.failures[0].stage, FetchStage::Info);
        assert_eq!(snapshot.failures[0].message, "Unknown symbol: B");
    }

    #[test]
    fn test_rows_keep_given_order() {
        let snapshot = assemble(vec![
            (sym("Z"), Ok(InfoRecord::default())),
            (sym("X"), Ok(InfoRecord::default())),
            (sym("Y"), Ok(InfoRecord::default())),
        ]);
        let tickers: Vec<&str> = snapshot.table.rows().iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["Z", "X", "Y"]);
    }

    #[test]
    fn test_mean_is_sum_over_count() {
        let snapshot = assemble(vec![
            (sym("A"), Ok(info(Some(0.1), None, None))),
            (sym("B"), Ok(info(Some(0.2), None, None))),
            (sym("C"), Ok(info(Some(0.3), None, None))),
        ]);
        assert_eq!(snapshot.summary.avg_price, Some((0.1 + 0.2 + 0.3) / 3.0));
    }

    #[test]
    fn test_avg_pe_ignores_missing() {
        let snapshot = assemble(vec![
            (sym("A"), Ok(info(None, None, Some(10.0)))),
            (sym("B"), Ok(info(None, None, None))),
            (sym("C"), Ok(info(None, None, Some(20.0)))),
        ]);
        assert_eq!(snapshot.summary.avg_pe, Some(15.0));
        assert_eq!(snapshot.summary.avg_price, None);
        assert_eq!(snapshot.summary.avg_market_cap, None);
    }

    #[test]
    fn test_independent_denominators() {
        let snapshot = assemble(vec![
            (sym("A"), Ok(info(Some(100.0), Some(1_000.0), None))),
            (sym("B"), Ok(info(Some(200.0), None, Some(30.0)))),
            (sym("C"), Ok(info(Some(300.0), Some(3_000.0), None))),
        ]);
        assert_eq!(snapshot.summary.avg_price, Some(200.0));
        assert_eq!(snapshot.summary.avg_market_cap, Some(2_000.0));
        assert_eq!(snapshot.summary.avg_pe, Some(30.0));
    }

    #[test]
    fn test_zero_is_a_value() {
        let snapshot = assemble(vec![
            (sym("A"), Ok(info(Some(0.0), None, None))),
            (sym("B"), Ok(info(Some(10.0), None, None))),
        ]);
        assert_eq!(snapshot.summary.avg_price, Some(5.0));
        assert_eq!(snapshot.table.rows()[0].price, Some(0.0));
        assert_eq!(snapshot.table.rows()[0].market_cap, None);
    }

    #[test]
    fn test_all_failed() {
        let snapshot = assemble(vec![(sym("A"), Err(AppError::fetch("A", "timeout")))]);
        assert!(snapshot.table.is_empty());
        assert_eq!(snapshot.summary, Summary::default());
        assert_eq!(snapshot.failures[0].message, "Error fetching A: timeout");
    }
}
