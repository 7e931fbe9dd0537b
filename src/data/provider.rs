use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::info::InfoRecord;
use crate::models::series::PriceSeries;
use crate::models::ticker::TickerSymbol;

/// Source of snapshot info and daily price history.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider ID used in logs.
    fn id(&self) -> &'static str;

    /// Current snapshot attributes for one symbol.
    async fn fetch_info(&self, symbol: &TickerSymbol) -> Result<InfoRecord, AppError>;

    /// Daily closes covering roughly `lookback_days` trading days, ascending.
    async fn fetch_price_series(
        &self,
        symbol: &TickerSymbol,
        lookback_days: usize,
    ) -> Result<PriceSeries, AppError>;
}
