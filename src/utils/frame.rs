use polars::prelude::{AnyValue, Column, DataFrame};
use serde_json::{json, Value};

use crate::commands::WatchlistReport;
use crate::errors::AppError;
use crate::models::metrics::{MetricsTable, METRICS_COLUMNS};
use crate::models::series::ReturnMatrix;

/// Metrics table as a DataFrame with the export headers as column names.
pub fn metrics_frame(table: &MetricsTable) -> Result<DataFrame, AppError> {
    let rows = table.rows();
    let tickers: Vec<String> = rows.iter().map(|r| r.ticker.to_string()).collect();
    let names: Vec<Option<String>> = rows.iter().map(|r| r.name.clone()).collect();

    let mut columns = vec![
        Column::new(METRICS_COLUMNS[0].into(), tickers),
        Column::new(METRICS_COLUMNS[1].into(), names),
    ];
    for (offset, header) in METRICS_COLUMNS[2..].iter().enumerate() {
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.numeric_cells()[offset]).collect();
        columns.push(Column::new((*header).into(), values));
    }

    Ok(DataFrame::new(columns)?)
}

/// Return matrix as a DataFrame: one `Date` column, then one column per ticker.
pub fn returns_frame(matrix: &ReturnMatrix) -> Result<DataFrame, AppError> {
    let dates: Vec<String> = matrix.dates.iter().map(|d| d.to_string()).collect();
    let mut columns = Vec::with_capacity(matrix.tickers.len() + 1);
    columns.push(Column::new("Date".into(), dates));
    for (ticker, values) in matrix.tickers.iter().zip(&matrix.values) {
        columns.push(Column::new(ticker.as_str().into(), values.clone()));
    }
    Ok(DataFrame::new(columns)?)
}

/// Convert a DataFrame to a Vec of JSON objects keyed by column name.
pub fn frame_to_json(df: &DataFrame) -> Result<Vec<Value>, AppError> {
    let mut rows = Vec::with_capacity(df.height());

    for i in 0..df.height() {
        let mut row = serde_json::Map::new();
        for col in df.get_columns() {
            let val = col.get(i)?;
            row.insert(col.name().to_string(), anyvalue_to_json(&val));
        }
        rows.push(Value::Object(row));
    }

    Ok(rows)
}

fn anyvalue_to_json(val: &AnyValue) -> Value {
    match val {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::Int32(n) => Value::Number((*n).into()),
        AnyValue::Int64(n) => Value::Number((*n).into()),
        AnyValue::UInt32(n) => Value::Number((*n).into()),
        AnyValue::UInt64(n) => Value::Number((*n).into()),
        AnyValue::Float64(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        _ => Value::String(format!("{}", val)),
    }
}

/// Display payload written to `watchlist.json`.
pub fn report_payload(report: &WatchlistReport) -> Result<Value, AppError> {
    let metrics = frame_to_json(&metrics_frame(&report.table)?)?;
    let returns = frame_to_json(&returns_frame(&report.returns)?)?;
    Ok(json!({
        "generatedAt": report.generated_at.to_rfc3339(),
        "tickers": report.tickers,
        "metrics": metrics,
        "summary": report.summary,
        "failures": report.failures,
        "warnings": report.warnings,
        "indicators": report.indicators,
        "returns": returns,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::info::InfoRecord;
    use crate::models::metrics::MetricsRow;
    use crate::models::ticker::TickerSymbol;
    use chrono::NaiveDate;

    fn sym(s: &str) -> TickerSymbol {
        TickerSymbol::parse(s).unwrap()
    }

    fn table() -> MetricsTable {
        MetricsTable::new(vec![
            MetricsRow::new(
                sym("AAPL"),
                InfoRecord {
                    name: Some("Apple Inc.".into()),
                    price: Some(190.5),
                    trailing_pe: Some(29.0),
                    ..Default::default()
                },
            ),
            MetricsRow::new(sym("ZZ"), InfoRecord::default()),
        ])
    }

    #[test]
    fn test_metrics_frame_shape() {
        let df = metrics_frame(&table()).unwrap();
        assert_eq!(df.height(), 2);
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, METRICS_COLUMNS.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn test_metrics_json_nulls() {
        let rows = frame_to_json(&metrics_frame(&table()).unwrap()).unwrap();
        assert_eq!(rows[0]["Ticker"], json!("AAPL"));
        assert_eq!(rows[0]["Price"], json!(190.5));
        assert_eq!(rows[0]["Market Cap"], Value::Null);
        assert_eq!(rows[1]["Name"], Value::Null);
        assert_eq!(rows[1]["PE Ratio"], Value::Null);
    }

    #[test]
    fn test_returns_frame() {
        let matrix = ReturnMatrix {
            tickers: vec![sym("A"), sym("B")],
            dates: vec![
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            ],
            values: vec![vec![1.0, -2.0], vec![0.5, 0.25]],
        };
        let df = returns_frame(&matrix).unwrap();
        assert_eq!(df.width(), 3);
        let rows = frame_to_json(&df).unwrap();
        assert_eq!(rows[1]["Date"], json!("2024-01-04"));
        assert_eq!(rows[1]["A"], json!(-2.0));
        assert_eq!(rows[0]["B"], json!(0.5));
    }

    #[test]
    fn test_empty_returns_frame() {
        let matrix = ReturnMatrix {
            tickers: vec![sym("A")],
            dates: Vec::new(),
            values: vec![Vec::new()],
        };
        let df = returns_frame(&matrix).unwrap();
        assert_eq!(df.height(), 0);
        assert!(frame_to_json(&df).unwrap().is_empty());
    }
}
