use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::errors::AppError;
use crate::models::info::InfoRecord;
use crate::models::series::PriceSeries;
use crate::models::ticker::TickerSymbol;

use super::provider::MarketDataProvider;

type CacheKey = (TickerSymbol, usize);

/// Time-bounded memo of price series keyed by symbol and lookback.
/// Info records always go to the inner provider since they change intraday.
pub struct CachedProvider {
    inner: Arc<dyn MarketDataProvider>,
    ttl: Duration,
    series: DashMap<CacheKey, (Instant, PriceSeries)>,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn MarketDataProvider>, ttl: Duration) -> Self {
        CachedProvider {
            inner,
            ttl,
            series: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Drop every expired entry.
    pub fn evict_expired(&self) {
        let ttl = self.ttl;
        self.series.retain(|_, (stored, _)| stored.elapsed() < ttl);
    }

    fn lookup(&self, key: &CacheKey) -> Option<PriceSeries> {
        let entry = self.series.get(key)?;
        let (stored, series) = entry.value();
        if stored.elapsed() < self.ttl {
            Some(series.clone())
        } else {
            None
        }
    }
}

#[async_trait]
impl MarketDataProvider for CachedProvider {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    async fn fetch_info(&self, symbol: &TickerSymbol) -> Result<InfoRecord, AppError> {
        self.inner.fetch_info(symbol).await
    }

    async fn fetch_price_series(
        &self,
        symbol: &TickerSymbol,
        lookback_days: usize,
    ) -> Result<PriceSeries, AppError> {
        let key = (symbol.clone(), lookback_days);
        if let Some(series) = self.lookup(&key) {
            debug!("Price cache hit: {} ({}d)", symbol, lookback_days);
            return Ok(series);
        }

        debug!("Price cache miss: {} ({}d)", symbol, lookback_days);
        let series = self.inner.fetch_price_series(symbol, lookback_days).await?;
        self.evict_expired();
        self.series.insert(key, (Instant::now(), series.clone()));
        Ok(series)
    }
}
