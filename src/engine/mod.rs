pub mod aggregator;
pub mod indicators;
pub mod returns;
