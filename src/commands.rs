use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::data::cache::CachedProvider;
use crate::data::provider::MarketDataProvider;
use crate::data::yahoo::YahooProvider;
use crate::engine::aggregator;
use crate::engine::indicators::{compute_indicators, MIN_POINTS};
use crate::engine::returns::return_matrix;
use crate::errors::AppError;
use crate::models::config::{IndicatorSettings, WatchlistConfig};
use crate::models::info::InfoRecord;
use crate::models::metrics::{FetchFailure, FetchStage, MetricsTable, Summary};
use crate::models::series::{IndicatorSeries, PriceSeries, ReturnMatrix};
use crate::models::ticker::{parse_watchlist, TickerSymbol};

/// Everything one "generate watchlist" invocation produces.
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistReport {
    pub generated_at: DateTime<Utc>,
    pub tickers: Vec<TickerSymbol>,
    pub table: MetricsTable,
    pub summary: Summary,
    /// Per-symbol fetch errors, in input order.
    pub failures: Vec<FetchFailure>,
    /// Non-fatal notes such as series too short for indicators.
    pub warnings: Vec<String>,
    pub indicators: Vec<IndicatorSeries>,
    pub returns: ReturnMatrix,
}

/// Result of the fetch step for one symbol. Prices are only requested once
/// the info fetch succeeded.
struct SymbolFetch {
    info: Result<InfoRecord, AppError>,
    prices: Option<Result<PriceSeries, AppError>>,
}

/// Build the provider stack described by the configuration.
pub fn provider_from_config(
    config: &WatchlistConfig,
) -> Result<Arc<dyn MarketDataProvider>, AppError> {
    let yahoo = YahooProvider::new(
        &config.provider_base_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let provider: Arc<dyn MarketDataProvider> = Arc::new(yahoo);
    if config.cache_ttl_secs == 0 {
        return Ok(provider);
    }
    Ok(Arc::new(CachedProvider::new(
        provider,
        Duration::from_secs(config.cache_ttl_secs),
    )))
}

/// Parse raw ticker input and generate the watchlist.
pub async fn generate_from_input(
    provider: Arc<dyn MarketDataProvider>,
    input: &str,
    lookback_days: usize,
    settings: IndicatorSettings,
) -> Result<WatchlistReport, AppError> {
    let symbols = parse_watchlist(input);
    generate_watchlist(provider, symbols, lookback_days, settings).await
}

/// Fetch, aggregate and compute indicators for the given symbols.
///
/// Symbols are fetched concurrently; a failure for one symbol is reported in
/// the result and never aborts the batch.
pub async fn generate_watchlist(
    provider: Arc<dyn MarketDataProvider>,
    symbols: Vec<TickerSymbol>,
    lookback_days: usize,
    settings: IndicatorSettings,
) -> Result<WatchlistReport, AppError> {
    if symbols.is_empty() {
        return Err(AppError::EmptyWatchlist);
    }
    settings.validate()?;

    info!(
        "Generating watchlist: {} symbols via {}, lookback {}d",
        symbols.len(),
        provider.id(),
        lookback_days
    );

    let fetched = fetch_all(provider, &symbols, lookback_days).await;

    let mut outcomes = Vec::with_capacity(symbols.len());
    let mut price_failures = Vec::new();
    let mut series = Vec::new();
    for (symbol, fetch) in symbols.iter().zip(fetched) {
        match fetch.prices {
            Some(Ok(s)) => series.push(s),
            Some(Err(e)) => {
                warn!("Could not fetch chart for {}: {}", symbol, e);
                price_failures.push(FetchFailure {
                    ticker: symbol.clone(),
                    stage: FetchStage::Prices,
                    message: e.to_string(),
                });
            }
            None => {}
        }
        outcomes.push((symbol.clone(), fetch.info));
    }

    let snapshot = aggregator::assemble(outcomes);

    let mut failures = snapshot.failures;
    failures.extend(price_failures);
    failures.sort_by_key(|f| symbols.iter().position(|s| *s == f.ticker));

    let warnings: Vec<String> = series
        .iter()
        .filter(|s| s.len() < MIN_POINTS)
        .map(|s| {
            let err = AppError::InsufficientData {
                needed: MIN_POINTS,
                available: s.len(),
            };
            warn!("{}: {}", s.ticker, err);
            format!("{}: {}", s.ticker, err)
        })
        .collect();

    let (indicators, returns) = tokio::task::spawn_blocking(move || {
        let indicators: Vec<IndicatorSeries> = series
            .par_iter()
            .map(|s| compute_indicators(s, &settings))
            .collect();
        let returns = return_matrix(&series);
        (indicators, returns)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?;

    info!(
        "Watchlist ready: {} rows, {} failures, {} charts, {} return dates",
        snapshot.table.len(),
        failures.len(),
        indicators.len(),
        returns.dates.len()
    );

    Ok(WatchlistReport {
        generated_at: Utc::now(),
        tickers: symbols,
        table: snapshot.table,
        summary: snapshot.summary,
        failures,
        warnings,
        indicators,
        returns,
    })
}

/// Run one fetch task per symbol and collect the results into slots indexed
/// by input position, so completion order never affects output order.
async fn fetch_all(
    provider: Arc<dyn MarketDataProvider>,
    symbols: &[TickerSymbol],
    lookback_days: usize,
) -> Vec<SymbolFetch> {
    let mut tasks = JoinSet::new();
    for (idx, symbol) in symbols.iter().cloned().enumerate() {
        let provider = provider.clone();
        tasks.spawn(async move {
            let fetch = fetch_symbol(provider.as_ref(), &symbol, lookback_days).await;
            (idx, fetch)
        });
    }

    let mut slots: Vec<Option<SymbolFetch>> = symbols.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, fetch)) => slots[idx] = Some(fetch),
            Err(e) => error!("Fetch task failed: {}", e),
        }
    }

    slots
        .into_iter()
        .zip(symbols)
        .map(|(slot, symbol)| {
            slot.unwrap_or_else(|| SymbolFetch {
                info: Err(AppError::fetch(symbol.as_str(), "fetch task did not complete")),
                prices: None,
            })
        })
        .collect()
}

async fn fetch_symbol(
    provider: &dyn MarketDataProvider,
    symbol: &TickerSymbol,
    lookback_days: usize,
) -> SymbolFetch {
    let info = provider.fetch_info(symbol).await;
    if info.is_err() {
        return SymbolFetch { info, prices: None };
    }
    let prices = provider.fetch_price_series(symbol, lookback_days).await;
    SymbolFetch {
        info,
        prices: Some(prices),
    }
}
