use chrono::Utc;

use crate::{error::StoreError, models::LeaderboardEntry, store::LeaderboardStore};

pub const STANDINGS_LIMIT: usize = 10;

/// Leaderboard date key for "today" (UTC).
pub fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Adds one cycle's worth of watchlist performance for an owner: the mean
/// percent change across the symbols that had a baseline. Returns the delta
/// that was recorded, if any.
pub async fn record_performance<S: LeaderboardStore + ?Sized>(
    store: &S,
    date: &str,
    scope_id: &str,
    owner_id: &str,
    changes: &[f64],
) -> Result<Option<f64>, StoreError> {
    if changes.is_empty() {
        return Ok(None);
    }

    let mean = changes.iter().sum::<f64>() / changes.len() as f64;
    store.add_score(date, scope_id, owner_id, mean).await?;
    Ok(Some(mean))
}

pub async fn standings<S: LeaderboardStore + ?Sized>(
    store: &S,
    scope_id: &str,
    date: &str,
    limit: usize,
) -> Result<Vec<LeaderboardEntry>, StoreError> {
    store.top_scores(scope_id, date, limit).await
}
