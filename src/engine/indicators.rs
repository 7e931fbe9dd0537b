use serde::{Deserialize, Serialize};

use crate::models::config::IndicatorSettings;
use crate::models::series::{IndicatorSeries, PriceSeries};

/// Minimum number of closes before any indicator is reported.
pub const MIN_POINTS: usize = 2;

/// RSI guide lines drawn on the chart.
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

/// Compute every chart indicator for one symbol.
///
/// Series shorter than [`MIN_POINTS`] produce `None` at every position; the
/// caller decides whether to warn about it.
pub fn compute_indicators(series: &PriceSeries, settings: &IndicatorSettings) -> IndicatorSeries {
    let close = series.closes();
    let len = close.len();

    if len < MIN_POINTS {
        return IndicatorSeries {
            ticker: series.ticker.clone(),
            dates: series.dates(),
            close,
            sma_fast: vec![None; len],
            sma_slow: vec![None; len],
            rsi: vec![None; len],
            macd: vec![None; len],
            signal: vec![None; len],
            histogram: vec![None; len],
        };
    }

    let (macd_line, signal_line, histogram) = macd(
        &close,
        settings.macd_fast,
        settings.macd_slow,
        settings.macd_signal,
    );

    IndicatorSeries {
        ticker: series.ticker.clone(),
        dates: series.dates(),
        sma_fast: sma(&close, settings.sma_fast),
        sma_slow: sma(&close, settings.sma_slow),
        rsi: rsi(&close, settings.rsi_period),
        macd: macd_line.into_iter().map(Some).collect(),
        signal: signal_line.into_iter().map(Some).collect(),
        histogram: histogram.into_iter().map(Some).collect(),
        close,
    }
}

// ── SMA ──

/// Simple Moving Average. First `period-1` values are `None`.
pub fn sma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let len = data.len();
    let mut result = vec![None; len];
    if period == 0 || len < period {
        return result;
    }
    for (i, window) in data.windows(period).enumerate() {
        result[i + period - 1] = Some(window.iter().sum::<f64>() / period as f64);
    }
    result
}

// ── EMA ──

/// Exponential Moving Average with `k = 2/(span+1)`, seeded with the first
/// value and no warm-up window.
pub fn ema(data: &[f64], span: usize) -> Vec<f64> {
    let mut result = Vec::with_capacity(data.len());
    let Some(&first) = data.first() else {
        return result;
    };
    let k = 2.0 / (span as f64 + 1.0);
    let mut prev = first;
    result.push(prev);
    for &value in &data[1..] {
        prev = value * k + prev * (1.0 - k);
        result.push(prev);
    }
    result
}

// ── RSI ──

/// Relative Strength Index over a simple rolling mean of gains and losses.
///
/// The first position has no prior close and contributes zero gain and
/// zero loss, so the first value appears at index `period-1`. A window with
/// losses of zero reports 100 when it has gains and `None` when it is flat.
pub fn rsi(close: &[f64], period: usize) -> Vec<Option<f64>> {
    let len = close.len();
    let mut gains = vec![0.0f64; len];
    let mut losses = vec![0.0f64; len];

    for i in 1..len {
        let change = close[i] - close[i - 1];
        if change > 0.0 {
            gains[i] = change;
        } else if change < 0.0 {
            losses[i] = -change;
        }
    }

    let avg_gain = sma(&gains, period);
    let avg_loss = sma(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(gain), Some(loss)) => rsi_from_averages(gain, loss),
            _ => None,
        })
        .collect()
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return if avg_gain > 0.0 { Some(100.0) } else { None };
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Position of an RSI reading relative to the 70/30 guide lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiZone {
    Overbought,
    Neutral,
    Oversold,
}

impl RsiZone {
    pub fn classify(value: f64) -> Self {
        if value >= RSI_OVERBOUGHT {
            RsiZone::Overbought
        } else if value <= RSI_OVERSOLD {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RsiZone::Overbought => "Overbought",
            RsiZone::Neutral => "Neutral",
            RsiZone::Oversold => "Oversold",
        }
    }
}

// ── MACD ──

/// MACD: returns (macd_line, signal_line, histogram).
pub fn macd(
    close: &[f64],
    fast_span: usize,
    slow_span: usize,
    signal_span: usize,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let fast_ema = ema(close, fast_span);
    let slow_ema = ema(close, slow_span);

    let macd_line: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(fast, slow)| fast - slow)
        .collect();

    let signal_line = ema(&macd_line, signal_span);

    let histogram = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    (macd_line, signal_line, histogram)
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::series::PricePoint;
    use crate::models::ticker::TickerSymbol;
    use chrono::{Duration, NaiveDate};

    fn assert_approx(actual: f64, expected: f64, epsilon: f64, msg: &str) {
        assert!(
            (actual - expected).abs() < epsilon,
            "{}: expected {}, got {}",
            msg,
            expected,
            actual
        );
    }

    fn series_of(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + Duration::days(i as i64),
                close,
            })
            .collect();
        PriceSeries::new(TickerSymbol::parse("TEST").unwrap(), points)
    }

    /// Deterministic zig-zag walk so every window mixes gains and losses.
    fn walk(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let result = sma(&data, 3);
        assert!(result[0].is_none());
        assert!(result[1].is_none());
        assert_approx(result[2].unwrap(), 2.0, 1e-10, "SMA[2]");
        assert_approx(result[3].unwrap(), 3.0, 1e-10, "SMA[3]");
        assert_approx(result[9].unwrap(), 9.0, 1e-10, "SMA[9]");
    }

    #[test]
    fn test_sma_available_count() {
        let data = walk(60);
        for period in [1, 5, 20, 50, 60, 61, 100] {
            let result = sma(&data, period);
            let available = result.iter().filter(|v| v.is_some()).count();
            assert_eq!(available, (data.len() + 1).saturating_sub(period), "period {}", period);
            for (i, value) in result.iter().enumerate() {
                if let Some(v) = value {
                    let window = &data[i + 1 - period..=i];
                    let mean = window.iter().sum::<f64>() / period as f64;
                    assert_approx(*v, mean, 1e-12, "window mean");
                }
            }
        }
    }

    #[test]
    fn test_sma_short_series_all_none() {
        let result = sma(&[1.0, 2.0, 3.0], 20);
        assert!(result.iter().all(|v| v.is_none()));
        assert!(sma(&[1.0, 2.0], 0).iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_ema_recurrence() {
        let result = ema(&[10.0, 11.0, 12.0, 11.0, 13.0], 3);
        assert_eq!(result, vec![10.0, 10.5, 11.25, 11.125, 12.0625]);
    }

    #[test]
    fn test_ema_empty() {
        assert!(ema(&[], 12).is_empty());
    }

    #[test]
    fn test_rsi_warmup_and_bounds() {
        let data = vec![
            44.0, 44.34, 44.09, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];
        let result = rsi(&data, 14);
        for (i, value) in result.iter().enumerate().take(13) {
            assert!(value.is_none(), "RSI[{}] should be None", i);
        }
        for value in result.iter().skip(13) {
            let v = value.expect("RSI available after warm-up");
            assert!((0.0..=100.0).contains(&v), "RSI out of range: {}", v);
        }
    }

    #[test]
    fn test_rsi_matches_rolling_means() {
        let data = walk(40);
        let result = rsi(&data, 14);
        let i = 30;
        let (mut gain, mut loss) = (0.0, 0.0);
        for j in (i + 1 - 14)..=i {
            let change = data[j] - data[j - 1];
            if change > 0.0 {
                gain += change;
            } else {
                loss -= change;
            }
        }
        let expected = 100.0 - 100.0 / (1.0 + (gain / 14.0) / (loss / 14.0));
        assert_approx(result[i].unwrap(), expected, 1e-9, "RSI[30]");
    }

    #[test]
    fn test_rsi_only_gains_is_100() {
        let data: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        let result = rsi(&data, 14);
        assert_eq!(result[13], Some(100.0));
        assert_eq!(result[19], Some(100.0));
    }

    #[test]
    fn test_rsi_flat_is_none() {
        let result = rsi(&[5.0; 20], 14);
        assert!(result.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_rsi_only_losses_is_zero() {
        let data: Vec<f64> = (0..20).map(|i| 50.0 - i as f64).collect();
        let result = rsi(&data, 14);
        assert_eq!(result[15], Some(0.0));
    }

    #[test]
    fn test_rsi_zone() {
        assert_eq!(RsiZone::classify(75.0), RsiZone::Overbought);
        assert_eq!(RsiZone::classify(70.0), RsiZone::Overbought);
        assert_eq!(RsiZone::classify(50.0), RsiZone::Neutral);
        assert_eq!(RsiZone::classify(30.0), RsiZone::Oversold);
        assert_eq!(RsiZone::Oversold.label(), "Oversold");
    }

    #[test]
    fn test_macd_basic() {
        let data: Vec<f64> = (1..=50).map(|i| 100.0 + (i as f64) * 0.5).collect();
        let (macd_line, signal, hist) = macd(&data, 12, 26, 9);
        assert_eq!(macd_line.len(), 50);
        assert_eq!(macd_line[0], 0.0);
        assert!(macd_line[49] > 0.0, "MACD should be positive in uptrend");
        assert!(signal[49] < macd_line[49], "Signal should lag behind");
        assert_approx(hist[49], macd_line[49] - signal[49], 1e-12, "Histogram");
    }

    #[test]
    fn test_macd_matches_ema_difference() {
        let data = walk(30);
        let (macd_line, signal, _) = macd(&data, 12, 26, 9);
        let fast = ema(&data, 12);
        let slow = ema(&data, 26);
        for i in 0..data.len() {
            assert_eq!(macd_line[i], fast[i] - slow[i]);
        }
        assert_eq!(signal, ema(&macd_line, 9));
    }

    #[test]
    fn test_compute_indicators_alignment() {
        let series = series_of(&walk(126));
        let out = compute_indicators(&series, &IndicatorSettings::default());
        assert_eq!(out.len(), 126);
        assert_eq!(out.dates, series.dates());
        assert_eq!(out.sma_fast.iter().filter(|v| v.is_some()).count(), 107);
        assert_eq!(out.sma_slow.iter().filter(|v| v.is_some()).count(), 77);
        assert!(out.sma_slow[48].is_none());
        assert!(out.sma_slow[49].is_some());
        assert!(out.rsi[12].is_none());
        assert!(out.rsi[13].is_some());
        assert!(out.macd.iter().all(|v| v.is_some()));
        assert!(out.signal.iter().all(|v| v.is_some()));
    }

    #[test]
    fn test_compute_indicators_short_series() {
        for closes in [vec![], vec![42.0]] {
            let series = series_of(&closes);
            let out = compute_indicators(&series, &IndicatorSettings::default());
            assert_eq!(out.len(), closes.len());
            assert!(out.macd.iter().all(|v| v.is_none()));
            assert!(out.signal.iter().all(|v| v.is_none()));
            assert!(out.rsi.iter().all(|v| v.is_none()));
        }
    }

    #[test]
    fn test_compute_indicators_idempotent() {
        let series = series_of(&walk(80));
        let settings = IndicatorSettings::default();
        let first = compute_indicators(&series, &settings);
        let second = compute_indicators(&series, &settings);
        assert_eq!(first, second);
        let bits = |v: &[Option<f64>]| -> Vec<Option<u64>> {
            v.iter().map(|x| x.map(f64::to_bits)).collect()
        };
        assert_eq!(bits(&first.rsi), bits(&second.rsi));
        assert_eq!(bits(&first.macd), bits(&second.macd));
    }
}
