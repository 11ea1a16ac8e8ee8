pub mod tracked_symbol;
pub mod threshold;
pub mod channel;
pub mod api_usage;
pub mod leaderboard;

pub use tracked_symbol::TrackedSymbol;
pub use threshold::{AlertThreshold, DEFAULT_THRESHOLD_PERCENT};
pub use channel::NotificationChannel;
pub use api_usage::ApiUsage;
pub use leaderboard::LeaderboardEntry;
