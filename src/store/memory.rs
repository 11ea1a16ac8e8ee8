use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    models::{ApiUsage, LeaderboardEntry, TrackedSymbol, DEFAULT_THRESHOLD_PERCENT},
};

use super::{LeaderboardStore, Store, UsageStore, WatchlistStore};

// (scope, owner, symbol)
type SymbolKey = (String, String, String);
// (scope, owner)
type OwnerKey = (String, String);

#[derive(Default)]
struct Tables {
    symbols: BTreeMap<SymbolKey, TrackedSymbol>,
    thresholds: BTreeMap<OwnerKey, f64>,
    channels: BTreeMap<String, String>,
    usage: Option<ApiUsage>,
    // (date, scope, owner)
    scores: BTreeMap<(String, String, String), f64>,
}

/// In-process store with the same semantics as the MongoDB one.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full row for one symbol, if tracked.
    pub async fn tracked(&self, scope_id: &str, owner_id: &str, symbol: &str) -> Option<TrackedSymbol> {
        let t = self.inner.read().await;
        t.symbols
            .get(&(scope_id.to_string(), owner_id.to_string(), symbol.to_string()))
            .cloned()
    }
}

#[async_trait]
impl WatchlistStore for MemoryStore {
    async fn list_scopes_with_tracked_symbols(&self) -> Result<Vec<String>, StoreError> {
        let t = self.inner.read().await;
        let mut scopes: Vec<String> = t.symbols.keys().map(|(s, _, _)| s.clone()).collect();
        scopes.dedup();
        Ok(scopes)
    }

    async fn list_owners_in_scope(&self, scope_id: &str) -> Result<Vec<String>, StoreError> {
        let t = self.inner.read().await;
        let mut owners: Vec<String> = t
            .symbols
            .keys()
            .filter(|(s, _, _)| s == scope_id)
            .map(|(_, o, _)| o.clone())
            .collect();
        owners.dedup();
        Ok(owners)
    }

    async fn get_threshold(&self, owner_id: &str, scope_id: &str) -> Result<f64, StoreError> {
        let t = self.inner.read().await;
        Ok(t.thresholds
            .get(&(scope_id.to_string(), owner_id.to_string()))
            .copied()
            .unwrap_or(DEFAULT_THRESHOLD_PERCENT))
    }

    async fn list_symbols(
        &self,
        owner_id: &str,
        scope_id: &str,
    ) -> Result<BTreeMap<String, Option<f64>>, StoreError> {
        let t = self.inner.read().await;
        Ok(t.symbols
            .iter()
            .filter(|((s, o, _), _)| s == scope_id && o == owner_id)
            .map(|((_, _, sym), row)| (sym.clone(), row.last_price))
            .collect())
    }

    async fn update_last_price(
        &self,
        owner_id: &str,
        scope_id: &str,
        symbol: &str,
        price: f64,
    ) -> Result<(), StoreError> {
        let mut t = self.inner.write().await;
        let key = (scope_id.to_string(), owner_id.to_string(), symbol.to_string());
        // untracked between read and write: nothing to update
        if let Some(row) = t.symbols.get_mut(&key) {
            row.last_price = Some(price);
            row.priced_at = Some(Utc::now().timestamp());
        }
        Ok(())
    }

    async fn get_notification_channel(&self, scope_id: &str) -> Result<Option<String>, StoreError> {
        let t = self.inner.read().await;
        Ok(t.channels.get(scope_id).cloned())
    }

    async fn add_symbol(
        &self,
        scope_id: &str,
        owner_id: &str,
        symbol: &str,
        price: Option<f64>,
    ) -> Result<bool, StoreError> {
        let mut t = self.inner.write().await;
        let key = (scope_id.to_string(), owner_id.to_string(), symbol.to_string());
        if t.symbols.contains_key(&key) {
            return Ok(false);
        }

        let now = Utc::now().timestamp();
        t.symbols.insert(
            key,
            TrackedSymbol {
                scope_id: scope_id.to_string(),
                owner_id: owner_id.to_string(),
                symbol: symbol.to_string(),
                last_price: price,
                added_at: now,
                priced_at: price.map(|_| now),
            },
        );
        Ok(true)
    }

    async fn remove_symbol(
        &self,
        scope_id: &str,
        owner_id: &str,
        symbol: &str,
    ) -> Result<bool, StoreError> {
        let mut t = self.inner.write().await;
        let key = (scope_id.to_string(), owner_id.to_string(), symbol.to_string());
        Ok(t.symbols.remove(&key).is_some())
    }

    async fn set_threshold(
        &self,
        owner_id: &str,
        scope_id: &str,
        percent: f64,
    ) -> Result<(), StoreError> {
        let mut t = self.inner.write().await;
        t.thresholds
            .insert((scope_id.to_string(), owner_id.to_string()), percent);
        Ok(())
    }

    async fn bind_channel(&self, scope_id: &str, channel_id: &str) -> Result<(), StoreError> {
        let mut t = self.inner.write().await;
        t.channels.insert(scope_id.to_string(), channel_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn load_usage(&self) -> Result<Option<ApiUsage>, StoreError> {
        Ok(self.inner.read().await.usage)
    }

    async fn save_usage(&self, usage: ApiUsage) -> Result<(), StoreError> {
        self.inner.write().await.usage = Some(usage);
        Ok(())
    }
}

#[async_trait]
impl LeaderboardStore for MemoryStore {
    async fn add_score(
        &self,
        date: &str,
        scope_id: &str,
        owner_id: &str,
        delta: f64,
    ) -> Result<(), StoreError> {
        let mut t = self.inner.write().await;
        *t.scores
            .entry((date.to_string(), scope_id.to_string(), owner_id.to_string()))
            .or_insert(0.0) += delta;
        Ok(())
    }

    async fn top_scores(
        &self,
        scope_id: &str,
        date: &str,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let t = self.inner.read().await;
        let mut entries: Vec<LeaderboardEntry> = t
            .scores
            .iter()
            .filter(|((d, s, _), _)| d == date && s == scope_id)
            .map(|((d, s, o), score)| LeaderboardEntry {
                date: d.clone(),
                scope_id: s.clone(),
                owner_id: o.clone(),
                score: *score,
            })
            .collect();

        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        entries.truncate(limit);
        Ok(entries)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
