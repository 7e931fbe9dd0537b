use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::errors::AppError;
use crate::models::info::InfoRecord;
use crate::models::series::{PricePoint, PriceSeries};
use crate::models::ticker::TickerSymbol;

use super::provider::MarketDataProvider;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) watchlist/0.1";
const SUMMARY_MODULES: &str = "price,summaryDetail,financialData";
/// Any response from this host sets the session cookie the crumb is bound to.
const COOKIE_URL: &str = "https://fc.yahoo.com";

/// Yahoo Finance client for quote summaries and daily charts.
///
/// quoteSummary requires a session cookie plus a crumb token, fetched once per
/// provider and reused for every symbol.
pub struct YahooProvider {
    client: Client,
    base_url: String,
    crumb: OnceCell<String>,
}

impl YahooProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .cookie_store(true)
            .build()?;
        Ok(YahooProvider {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            crumb: OnceCell::new(),
        })
    }

    async fn get_body(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<(StatusCode, String), AppError> {
        debug!("GET {}", url);
        let resp = self.client.get(url).query(query).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok((status, body))
    }

    async fn crumb(&self) -> Result<&str, AppError> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                // Status is irrelevant here, only the Set-Cookie header matters.
                self.client.get(COOKIE_URL).send().await?;
                let url = format!("{}/v1/test/getcrumb", self.base_url);
                let (status, body) = self.get_body(&url, &[]).await?;
                check_status(status.as_u16(), parse_crumb(&body))
            })
            .await?;
        debug!("Using Yahoo crumb");
        Ok(crumb.as_str())
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn id(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_info(&self, symbol: &TickerSymbol) -> Result<InfoRecord, AppError> {
        let crumb = self.crumb().await?;
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);
        let (status, body) = self
            .get_body(&url, &[("modules", SUMMARY_MODULES), ("crumb", crumb)])
            .await?;
        check_status(status.as_u16(), parse_quote_summary(symbol, &body))
    }

    async fn fetch_price_series(
        &self,
        symbol: &TickerSymbol,
        lookback_days: usize,
    ) -> Result<PriceSeries, AppError> {
        let now = Utc::now().timestamp();
        let span = calendar_days(lookback_days) as i64 * 86_400;
        let period1 = (now - span).to_string();
        let period2 = now.to_string();
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let (status, body) = self
            .get_body(
                &url,
                &[("period1", &period1), ("period2", &period2), ("interval", "1d")],
            )
            .await?;
        check_status(status.as_u16(), parse_chart(symbol, &body))
    }
}

/// Merge the HTTP status into the parse result. Unknown symbols keep their
/// meaning; any other non-2xx answer becomes an HTTP error carrying the status
/// and, when Yahoo sent one, its description.
pub fn check_status<T>(status: u16, parsed: Result<T, AppError>) -> Result<T, AppError> {
    if (200..300).contains(&status) {
        return parsed;
    }
    match parsed {
        Err(AppError::UnknownSymbol(s)) => Err(AppError::UnknownSymbol(s)),
        Err(AppError::ProviderResponse(msg)) => {
            Err(AppError::Http(format!("status {}: {}", status, msg)))
        }
        _ => Err(AppError::Http(format!("status {}", status))),
    }
}

/// The crumb endpoint answers with the bare token as plain text.
pub fn parse_crumb(body: &str) -> Result<String, AppError> {
    let crumb = body.trim();
    if crumb.is_empty() || crumb.contains(|c: char| c.is_whitespace() || c == '<' || c == '{') {
        return Err(AppError::ProviderResponse("Yahoo returned no crumb".into()));
    }
    Ok(crumb.to_string())
}

/// Calendar days covering `trading_days` sessions (252 sessions a year).
pub fn calendar_days(trading_days: usize) -> usize {
    (trading_days * 365).div_ceil(252)
}

// ── Quote summary schema ──

#[derive(Deserialize, Debug)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: Option<QuoteSummary>,
    finance: Option<FinanceBody>,
}

/// Auth and rate-limit errors arrive as `{"finance": {"error": {...}}}`.
#[derive(Deserialize, Debug)]
struct FinanceBody {
    error: Option<YahooError>,
}

#[derive(Deserialize, Debug)]
struct QuoteSummary {
    result: Option<Vec<SummaryModules>>,
    error: Option<YahooError>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct SummaryModules {
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetail>,
    financial_data: Option<FinancialData>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    short_name: Option<String>,
    market_cap: RawValue,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct SummaryDetail {
    market_cap: RawValue,
    fifty_two_week_high: RawValue,
    fifty_two_week_low: RawValue,
    #[serde(rename = "trailingPE")]
    trailing_pe: RawValue,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct FinancialData {
    current_price: RawValue,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`; missing ones are `{}`.
#[derive(Deserialize, Debug, Default, Clone, Copy)]
#[serde(default)]
struct RawValue {
    raw: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

impl YahooError {
    fn into_app_error(self, symbol: &TickerSymbol) -> AppError {
        match self.code.as_deref() {
            Some("Not Found") => AppError::UnknownSymbol(symbol.to_string()),
            _ => AppError::ProviderResponse(
                self.description
                    .or(self.code)
                    .unwrap_or_else(|| "unknown error".to_string()),
            ),
        }
    }
}

/// Extract the snapshot fields from a quoteSummary response body.
pub fn parse_quote_summary(symbol: &TickerSymbol, body: &str) -> Result<InfoRecord, AppError> {
    let envelope: QuoteSummaryEnvelope = serde_json::from_str(body)?;
    if let Some(err) = envelope.finance.and_then(|f| f.error) {
        return Err(err.into_app_error(symbol));
    }
    let summary = envelope
        .quote_summary
        .ok_or_else(|| AppError::ProviderResponse("response has no quoteSummary".into()))?;
    if let Some(err) = summary.error {
        return Err(err.into_app_error(symbol));
    }
    let modules = summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| AppError::UnknownSymbol(symbol.to_string()))?;

    let price = modules.price.unwrap_or_default();
    let detail = modules.summary_detail.unwrap_or_default();
    let financial = modules.financial_data.unwrap_or_default();

    Ok(InfoRecord {
        name: price.short_name.filter(|n| !n.trim().is_empty()),
        price: financial.current_price.raw,
        market_cap: price.market_cap.raw.or(detail.market_cap.raw),
        high_52w: detail.fifty_two_week_high.raw,
        low_52w: detail.fifty_two_week_low.raw,
        trailing_pe: detail.trailing_pe.raw,
    })
}

// ── Chart schema ──

#[derive(Deserialize, Debug)]
struct ChartEnvelope {
    chart: Option<ChartResponse>,
    finance: Option<FinanceBody>,
}

#[derive(Deserialize, Debug)]
struct ChartResponse {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Deserialize, Debug)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ChartQuote {
    close: Vec<Option<f64>>,
}

/// Extract daily closes from a chart response body. Days with a null close
/// are left out rather than filled.
pub fn parse_chart(symbol: &TickerSymbol, body: &str) -> Result<PriceSeries, AppError> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;
    if let Some(err) = envelope.finance.and_then(|f| f.error) {
        return Err(err.into_app_error(symbol));
    }
    let chart = envelope
        .chart
        .ok_or_else(|| AppError::ProviderResponse("response has no chart".into()))?;
    if let Some(err) = chart.error {
        return Err(err.into_app_error(symbol));
    }
    let result = chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| AppError::UnknownSymbol(symbol.to_string()))?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .unwrap_or_default()
        .close;

    let points = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let close = close.filter(|c| c.is_finite())?;
            let date = DateTime::from_timestamp(ts, 0)?.date_naive();
            Some(PricePoint { date, close })
        })
        .collect();

    Ok(PriceSeries::new(symbol.clone(), points))
}
