use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    // YYYY-MM-DD (UTC)
    pub date: String,
    pub scope_id: String,
    pub owner_id: String,
    pub score: f64,
}
