pub mod export;
pub mod format;
pub mod frame;
pub mod report;
