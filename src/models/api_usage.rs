use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const API_USAGE_ID: &str = "api_usage";

/// Monthly outbound quote call counter (singleton document).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiUsage {
    pub count: i64,
    // unix seconds
    pub reset_at: i64,
}

impl ApiUsage {
    pub fn reset_at_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.reset_at, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }
}
