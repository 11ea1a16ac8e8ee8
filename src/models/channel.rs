use serde::{Deserialize, Serialize};

/// Where alerts for a scope are posted. At most one per scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationChannel {
    // scope id is the primary key
    #[serde(rename = "_id")]
    pub scope_id: String,

    pub channel_id: String,
    pub bound_at: i64,
}
