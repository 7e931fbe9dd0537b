pub mod commands;
pub mod data;
pub mod engine;
pub mod errors;
pub mod models;
pub mod utils;

use std::fs;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::errors::AppError;
use crate::models::config::WatchlistConfig;
use crate::utils::{export, frame, report};

/// Install the global subscriber. Defaults to `info` when `RUST_LOG` is unset.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

/// Generate the watchlist described by the environment and write its outputs.
pub async fn run() -> Result<(), AppError> {
    init_tracing();
    info!("Starting watchlist generator");

    let config = WatchlistConfig::load()?;
    let provider = commands::provider_from_config(&config)?;

    let watchlist = commands::generate_from_input(
        provider,
        &config.tickers,
        config.lookback_days,
        config.indicators,
    )
    .await?;

    match frame::metrics_frame(&watchlist.table) {
        Ok(df) => info!("Metrics:\n{}", df),
        Err(e) => warn!("Could not render metrics table: {}", e),
    }

    fs::create_dir_all(&config.output_dir).map_err(|e| {
        AppError::FileWrite(format!("{}: {}", config.output_dir.display(), e))
    })?;

    export::export_metrics(&watchlist.table, config.export_format, &config.output_dir)?;
    let json_path = export::write_report_json(&watchlist, &config.output_dir)?;
    info!("Display payload written to {}", json_path.display());

    if config.write_report {
        let path = config.output_dir.join(report::REPORT_FILE_NAME);
        report::write_report_html(&watchlist, &path)?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
