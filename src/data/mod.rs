pub mod cache;
pub mod provider;
pub mod yahoo;
