use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;

use super::ticker::DEFAULT_TICKERS;

/// Approximately six months of trading days.
pub const DEFAULT_LOOKBACK_DAYS: usize = 126;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Export file format for the metrics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    /// File name offered for download.
    pub fn file_name(&self) -> String {
        format!("stock_watchlist.{}", self.as_str())
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// Window lengths for the chart indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        IndicatorSettings {
            sma_fast: 20,
            sma_slow: 50,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl IndicatorSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        let periods = [
            ("sma_fast", self.sma_fast),
            ("sma_slow", self.sma_slow),
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(AppError::InvalidIndicatorParams(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        if self.macd_fast >= self.macd_slow {
            return Err(AppError::InvalidIndicatorParams(format!(
                "macd_fast ({}) must be shorter than macd_slow ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        Ok(())
    }
}

/// Runtime configuration for one watchlist generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistConfig {
    /// Raw comma-separated ticker input.
    pub tickers: String,
    pub lookback_days: usize,
    pub export_format: ExportFormat,
    pub output_dir: PathBuf,
    /// Lifetime of cached price series. 0 disables caching, which suits a
    /// one-shot run; callers that regenerate with the same provider set it.
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub provider_base_url: String,
    pub write_report: bool,
    pub indicators: IndicatorSettings,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        WatchlistConfig {
            tickers: DEFAULT_TICKERS.to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            export_format: ExportFormat::Csv,
            output_dir: PathBuf::from("./output"),
            cache_ttl_secs: 0,
            request_timeout_secs: 10,
            provider_base_url: DEFAULT_BASE_URL.to_string(),
            write_report: true,
            indicators: IndicatorSettings::default(),
        }
    }
}

impl WatchlistConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::FileRead(format!("{}: {}", path.display(), e)))?;
        let config: WatchlistConfig = serde_json::from_str(&content)
            .map_err(|e| AppError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `WATCHLIST_CONFIG` (if set) and apply environment overrides.
    pub fn load() -> Result<Self, AppError> {
        let mut config = match std::env::var_os("WATCHLIST_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `WATCHLIST_*` overrides from the given lookup.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), AppError> {
        if let Some(tickers) = lookup("WATCHLIST_TICKERS") {
            self.tickers = tickers;
        }
        if let Some(format) = lookup("WATCHLIST_EXPORT") {
            self.export_format = format.parse().map_err(AppError::InvalidConfig)?;
        }
        if let Some(dir) = lookup("WATCHLIST_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.lookback_days == 0 {
            return Err(AppError::InvalidConfig(
                "lookback_days must be greater than zero".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        self.indicators.validate()
    }
}
