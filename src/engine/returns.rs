use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::models::series::{PriceSeries, ReturnMatrix};

/// Align all series on the dates every one of them has a close for.
/// Returns the shared ascending dates and one close vector per series.
pub fn align_closes(series: &[PriceSeries]) -> (Vec<NaiveDate>, Vec<Vec<f64>>) {
    if series.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let lookups: Vec<HashMap<NaiveDate, f64>> = series
        .iter()
        .map(|s| s.points.iter().map(|p| (p.date, p.close)).collect())
        .collect();

    let common: BTreeSet<NaiveDate> = series[0]
        .points
        .iter()
        .map(|p| p.date)
        .filter(|d| lookups.iter().all(|l| l.contains_key(d)))
        .collect();

    let dates: Vec<NaiveDate> = common.into_iter().collect();
    let closes: Vec<Vec<f64>> = lookups
        .iter()
        .map(|l| dates.iter().map(|d| l[d]).collect::<Vec<f64>>())
        .collect();

    (dates, closes)
}

/// Percentage change between consecutive values. The first value has no
/// predecessor and is not emitted.
pub fn pct_change(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0] * 100.0)
        .collect()
}

/// Daily percentage returns for every series on their common date axis.
/// Rows follow the order of `series`.
pub fn return_matrix(series: &[PriceSeries]) -> ReturnMatrix {
    let tickers = series.iter().map(|s| s.ticker.clone()).collect();
    let (dates, closes) = align_closes(series);

    if dates.len() < 2 {
        return ReturnMatrix {
            tickers,
            dates: Vec::new(),
            values: vec![Vec::new(); series.len()],
        };
    }

    ReturnMatrix {
        tickers,
        dates: dates[1..].to_vec(),
        values: closes.iter().map(|c| pct_change(c)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::series::PricePoint;
    use crate::models::ticker::TickerSymbol;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn series(ticker: &str, points: &[(u32, f64)]) -> PriceSeries {
        PriceSeries::new(
            TickerSymbol::parse(ticker).unwrap(),
            points
                .iter()
                .map(|&(d, close)| PricePoint { date: day(d), close })
                .collect(),
        )
    }

    #[test]
    fn test_pct_change() {
        let result = pct_change(&[100.0, 105.0, 110.0, 99.0]);
        assert_eq!(
            result,
            vec![
                (105.0 - 100.0) / 100.0 * 100.0,
                (110.0 - 105.0) / 105.0 * 100.0,
                (99.0 - 110.0) / 110.0 * 100.0,
            ]
        );
        assert!(pct_change(&[1.0]).is_empty());
    }

    #[test]
    fn test_matrix_drops_first_row() {
        let a = series("A", &[(1, 10.0), (2, 11.0), (3, 12.1)]);
        let b = series("B", &[(1, 20.0), (2, 19.0), (3, 19.0)]);
        let m = return_matrix(&[a, b]);
        assert_eq!(m.dates, vec![day(2), day(3)]);
        let a_sym = TickerSymbol::parse("A").unwrap();
        let b_sym = TickerSymbol::parse("B").unwrap();
        assert_eq!(m.cell(&a_sym, day(2)), Some((11.0 - 10.0) / 10.0 * 100.0));
        assert_eq!(m.cell(&a_sym, day(3)), Some((12.1 - 11.0) / 11.0 * 100.0));
        assert_eq!(m.cell(&b_sym, day(2)), Some((19.0 - 20.0) / 20.0 * 100.0));
        assert_eq!(m.cell(&b_sym, day(3)), Some(0.0));
        assert_eq!(m.cell(&a_sym, day(1)), None);
    }

    #[test]
    fn test_matrix_inner_joins_dates() {
        // B is missing day 3 and has an extra day 6.
        let a = series("A", &[(1, 10.0), (2, 10.5), (3, 11.0), (4, 12.0), (5, 12.5)]);
        let b = series("B", &[(1, 50.0), (2, 51.0), (4, 49.0), (5, 48.0), (6, 47.0)]);
        let m = return_matrix(&[a, b]);
        assert_eq!(m.dates, vec![day(2), day(4), day(5)]);
        let a_sym = TickerSymbol::parse("A").unwrap();
        // Day 4 return is measured against the previous common date (day 2).
        assert_eq!(m.cell(&a_sym, day(4)), Some((12.0 - 10.5) / 10.5 * 100.0));
        assert_eq!(m.values[1].len(), 3);
    }

    #[test]
    fn test_matrix_keeps_input_order() {
        let z = series("Z", &[(1, 1.0), (2, 2.0)]);
        let a = series("A", &[(1, 1.0), (2, 3.0)]);
        let m = return_matrix(&[z, a]);
        let names: Vec<&str> = m.tickers.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["Z", "A"]);
        assert_eq!(m.values[0], vec![100.0]);
        assert_eq!(m.values[1], vec![200.0]);
    }

    #[test]
    fn test_matrix_short_or_disjoint() {
        let a = series("A", &[(1, 10.0), (2, 11.0)]);
        let b = series("B", &[(3, 10.0), (4, 11.0)]);
        let m = return_matrix(&[a, b]);
        assert!(m.is_empty());
        assert_eq!(m.tickers.len(), 2);

        let single = return_matrix(&[series("C", &[(1, 5.0)])]);
        assert!(single.is_empty());
        assert!(return_matrix(&[]).is_empty());
    }
}
