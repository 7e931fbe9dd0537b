pub mod config;
pub mod info;
pub mod metrics;
pub mod series;
pub mod ticker;
