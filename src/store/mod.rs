//! Persistence boundary.
//!
//! The monitoring loop and the command surface only ever talk to these traits.
//! Every write is a single-document (single-row) operation, so each one is
//! atomic on its own and the loop needs no locking: commands never write
//! `last_price`, and the loop writes nothing else on a tracked symbol.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{
    error::StoreError,
    models::{ApiUsage, LeaderboardEntry},
};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Distinct scopes that have at least one tracked symbol.
    async fn list_scopes_with_tracked_symbols(&self) -> Result<Vec<String>, StoreError>;

    async fn list_owners_in_scope(&self, scope_id: &str) -> Result<Vec<String>, StoreError>;

    /// Alert threshold in percent, falling back to the default when unset.
    async fn get_threshold(&self, owner_id: &str, scope_id: &str) -> Result<f64, StoreError>;

    async fn list_symbols(
        &self,
        owner_id: &str,
        scope_id: &str,
    ) -> Result<BTreeMap<String, Option<f64>>, StoreError>;

    async fn update_last_price(
        &self,
        owner_id: &str,
        scope_id: &str,
        symbol: &str,
        price: f64,
    ) -> Result<(), StoreError>;

    async fn get_notification_channel(&self, scope_id: &str) -> Result<Option<String>, StoreError>;

    /// Returns false when the symbol was already on the watchlist (nothing written).
    async fn add_symbol(
        &self,
        scope_id: &str,
        owner_id: &str,
        symbol: &str,
        price: Option<f64>,
    ) -> Result<bool, StoreError>;

    /// Returns false when there was nothing to remove.
    async fn remove_symbol(
        &self,
        scope_id: &str,
        owner_id: &str,
        symbol: &str,
    ) -> Result<bool, StoreError>;

    async fn set_threshold(
        &self,
        owner_id: &str,
        scope_id: &str,
        percent: f64,
    ) -> Result<(), StoreError>;

    async fn bind_channel(&self, scope_id: &str, channel_id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn load_usage(&self) -> Result<Option<ApiUsage>, StoreError>;

    async fn save_usage(&self, usage: ApiUsage) -> Result<(), StoreError>;
}

#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    async fn add_score(
        &self,
        date: &str,
        scope_id: &str,
        owner_id: &str,
        delta: f64,
    ) -> Result<(), StoreError>;

    /// Highest score first.
    async fn top_scores(
        &self,
        scope_id: &str,
        date: &str,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

#[async_trait]
pub trait Store: WatchlistStore + UsageStore + LeaderboardStore {
    /// Readiness check.
    async fn ping(&self) -> Result<(), StoreError>;
}
