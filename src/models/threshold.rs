use serde::{Deserialize, Serialize};

pub const DEFAULT_THRESHOLD_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertThreshold {
    pub owner_id: String,
    pub scope_id: String,
    pub percent: f64,
}
