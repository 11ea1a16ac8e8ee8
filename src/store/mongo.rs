use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    options::{FindOptions, ReplaceOptions, UpdateOptions},
    Collection, Database,
};

use crate::{
    error::StoreError,
    models::{
        api_usage::API_USAGE_ID, AlertThreshold, ApiUsage, LeaderboardEntry,
        NotificationChannel, TrackedSymbol, DEFAULT_THRESHOLD_PERCENT,
    },
};

use super::{LeaderboardStore, Store, UsageStore, WatchlistStore};

pub const TRACKED_SYMBOLS: &str = "tracked_symbols";
pub const THRESHOLDS: &str = "thresholds";
pub const CHANNELS: &str = "channels";
pub const API_USAGE: &str = "api_usage";
pub const LEADERBOARD: &str = "leaderboard";

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn symbols(&self) -> Collection<TrackedSymbol> {
        self.db.collection::<TrackedSymbol>(TRACKED_SYMBOLS)
    }

    fn thresholds(&self) -> Collection<AlertThreshold> {
        self.db.collection::<AlertThreshold>(THRESHOLDS)
    }

    fn channels(&self) -> Collection<NotificationChannel> {
        self.db.collection::<NotificationChannel>(CHANNELS)
    }

    fn usage(&self) -> Collection<Document> {
        self.db.collection::<Document>(API_USAGE)
    }

    fn leaderboard(&self) -> Collection<LeaderboardEntry> {
        self.db.collection::<LeaderboardEntry>(LEADERBOARD)
    }
}

fn strings(values: Vec<Bson>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|v| match v {
            Bson::String(s) => Some(s),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl WatchlistStore for MongoStore {
    async fn list_scopes_with_tracked_symbols(&self) -> Result<Vec<String>, StoreError> {
        let scopes = self.symbols().distinct("scope_id", None, None).await?;
        Ok(strings(scopes))
    }

    async fn list_owners_in_scope(&self, scope_id: &str) -> Result<Vec<String>, StoreError> {
        let owners = self
            .symbols()
            .distinct("owner_id", doc! { "scope_id": scope_id }, None)
            .await?;
        Ok(strings(owners))
    }

    async fn get_threshold(&self, owner_id: &str, scope_id: &str) -> Result<f64, StoreError> {
        let found = self
            .thresholds()
            .find_one(doc! { "owner_id": owner_id, "scope_id": scope_id }, None)
            .await?;

        Ok(found
            .map(|t| t.percent)
            .unwrap_or(DEFAULT_THRESHOLD_PERCENT))
    }

    async fn list_symbols(
        &self,
        owner_id: &str,
        scope_id: &str,
    ) -> Result<BTreeMap<String, Option<f64>>, StoreError> {
        let mut cursor = self
            .symbols()
            .find(doc! { "scope_id": scope_id, "owner_id": owner_id }, None)
            .await?;

        let mut map = BTreeMap::new();
        while let Some(res) = cursor.next().await {
            let row = res?;
            map.insert(row.symbol, row.last_price);
        }

        Ok(map)
    }

    async fn update_last_price(
        &self,
        owner_id: &str,
        scope_id: &str,
        symbol: &str,
        price: f64,
    ) -> Result<(), StoreError> {
        // no upsert: a symbol untracked mid-cycle stays untracked
        self.symbols()
            .update_one(
                doc! { "scope_id": scope_id, "owner_id": owner_id, "symbol": symbol },
                doc! { "$set": { "last_price": price, "priced_at": Utc::now().timestamp() } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn get_notification_channel(&self, scope_id: &str) -> Result<Option<String>, StoreError> {
        let found = self
            .channels()
            .find_one(doc! { "_id": scope_id }, None)
            .await?;
        Ok(found.map(|c| c.channel_id))
    }

    async fn add_symbol(
        &self,
        scope_id: &str,
        owner_id: &str,
        symbol: &str,
        price: Option<f64>,
    ) -> Result<bool, StoreError> {
        let now = Utc::now().timestamp();
        let priced_at = price.map(|_| now);
        let res = self
            .symbols()
            .update_one(
                doc! { "scope_id": scope_id, "owner_id": owner_id, "symbol": symbol },
                doc! {
                    "$setOnInsert": {
                        "last_price": price,
                        "added_at": now,
                        "priced_at": priced_at,
                    }
                },
                UpdateOptions::builder().upsert(true).build(),
            )
            .await?;

        Ok(res.upserted_id.is_some())
    }

    async fn remove_symbol(
        &self,
        scope_id: &str,
        owner_id: &str,
        symbol: &str,
    ) -> Result<bool, StoreError> {
        let res = self
            .symbols()
            .delete_one(
                doc! { "scope_id": scope_id, "owner_id": owner_id, "symbol": symbol },
                None,
            )
            .await?;
        Ok(res.deleted_count > 0)
    }

    async fn set_threshold(
        &self,
        owner_id: &str,
        scope_id: &str,
        percent: f64,
    ) -> Result<(), StoreError> {
        self.thresholds()
            .update_one(
                doc! { "owner_id": owner_id, "scope_id": scope_id },
                doc! { "$set": { "percent": percent } },
                UpdateOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    async fn bind_channel(&self, scope_id: &str, channel_id: &str) -> Result<(), StoreError> {
        self.channels()
            .update_one(
                doc! { "_id": scope_id },
                doc! { "$set": { "channel_id": channel_id, "bound_at": Utc::now().timestamp() } },
                UpdateOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UsageStore for MongoStore {
    async fn load_usage(&self) -> Result<Option<ApiUsage>, StoreError> {
        let Some(d) = self.usage().find_one(doc! { "_id": API_USAGE_ID }, None).await? else {
            return Ok(None);
        };

        let count = d
            .get_i64("count")
            .map_err(|e| StoreError::Decode(format!("api_usage.count: {e}")))?;
        let reset_at = d
            .get_i64("reset_at")
            .map_err(|e| StoreError::Decode(format!("api_usage.reset_at: {e}")))?;

        Ok(Some(ApiUsage { count, reset_at }))
    }

    async fn save_usage(&self, usage: ApiUsage) -> Result<(), StoreError> {
        self.usage()
            .replace_one(
                doc! { "_id": API_USAGE_ID },
                doc! { "_id": API_USAGE_ID, "count": usage.count, "reset_at": usage.reset_at },
                ReplaceOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LeaderboardStore for MongoStore {
    async fn add_score(
        &self,
        date: &str,
        scope_id: &str,
        owner_id: &str,
        delta: f64,
    ) -> Result<(), StoreError> {
        self.leaderboard()
            .update_one(
                doc! { "date": date, "scope_id": scope_id, "owner_id": owner_id },
                doc! { "$inc": { "score": delta } },
                UpdateOptions::builder().upsert(true).build(),
            )
            .await?;
        Ok(())
    }

    async fn top_scores(
        &self,
        scope_id: &str,
        date: &str,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let find_opts = FindOptions::builder()
            .sort(doc! { "score": -1 })
            .limit(limit as i64)
            .build();

        let mut cursor = self
            .leaderboard()
            .find(doc! { "date": date, "scope_id": scope_id }, find_opts)
            .await?;

        let mut items = Vec::new();
        while let Some(res) = cursor.next().await {
            items.push(res?);
        }
        Ok(items)
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}
