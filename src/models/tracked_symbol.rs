use serde::{Deserialize, Serialize};

/// One symbol on one owner's watchlist inside a scope (chat server).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedSymbol {
    pub scope_id: String,
    pub owner_id: String,
    pub symbol: String,

    // baseline; None until the first successful price
    #[serde(default)]
    pub last_price: Option<f64>,

    pub added_at: i64,
    #[serde(default)]
    pub priced_at: Option<i64>,
}
