use serde::Serialize;

/// All application errors, categorized by domain.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ── Input ──
    #[error("Invalid ticker symbol: {0:?}")]
    InvalidTicker(String),

    #[error("No ticker symbols given")]
    EmptyWatchlist,

    // ── Provider ──
    #[error("Error fetching {ticker}: {message}")]
    Fetch { ticker: String, message: String },

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected provider response: {0}")]
    ProviderResponse(String),

    // ── Indicator ──
    #[error("Insufficient data for indicator calculation: need {needed} bars, got {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("Invalid indicator parameters: {0}")]
    InvalidIndicatorParams(String),

    // ── Export / Files ──
    #[error("Failed to read file: {0}")]
    FileRead(String),

    #[error("Failed to write file: {0}")]
    FileWrite(String),

    #[error("Export failed: {0}")]
    Export(String),

    // ── Configuration ──
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Serialization ──
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ── General ──
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap any provider-side error as a per-symbol fetch failure.
    pub fn fetch(ticker: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        AppError::Fetch {
            ticker: ticker.into(),
            message: cause.to_string(),
        }
    }
}

/// Serializable error response for the display layer.
#[derive(Debug, Serialize, Clone)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let code = match err {
            AppError::InvalidTicker(_) => "INVALID_TICKER",
            AppError::EmptyWatchlist => "EMPTY_WATCHLIST",
            AppError::Fetch { .. } => "FETCH",
            AppError::UnknownSymbol(_) => "UNKNOWN_SYMBOL",
            AppError::Http(_) => "HTTP",
            AppError::ProviderResponse(_) => "PROVIDER_RESPONSE",
            AppError::InsufficientData { .. } => "INSUFFICIENT_DATA",
            AppError::InvalidIndicatorParams(_) => "INVALID_INDICATOR_PARAMS",
            AppError::FileRead(_) => "FILE_READ",
            AppError::FileWrite(_) => "FILE_WRITE",
            AppError::Export(_) => "EXPORT",
            AppError::InvalidConfig(_) => "INVALID_CONFIG",
            AppError::Serialization(_) => "SERIALIZATION",
            AppError::Internal(_) => "INTERNAL",
        };
        ErrorResponse {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let response = ErrorResponse::from(self);
        response.serialize(serializer)
    }
}

// ── Conversions from external errors ──

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileRead(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::FileWrite(err.to_string())
    }
}

impl From<polars::error::PolarsError> for AppError {
    fn from(err: polars::error::PolarsError) -> Self {
        AppError::Export(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        AppError::Export(err.to_string())
    }
}
