use serde::{Deserialize, Serialize};

/// Snapshot attributes for one symbol as reported by the provider.
/// Any field the provider omits stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoRecord {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub high_52w: Option<f64>,
    pub low_52w: Option<f64>,
    pub trailing_pe: Option<f64>,
}
