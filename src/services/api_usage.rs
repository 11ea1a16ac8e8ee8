use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use tokio::sync::Mutex;

use crate::{error::StoreError, models::ApiUsage, store::UsageStore};

/// Monthly budget bookkeeping for outbound quote calls.
///
/// The reset is lazy: it is applied by whichever `record_call` or `usage`
/// first runs at or after `reset_at`. Nothing runs on a timer.
#[derive(Clone)]
pub struct ApiUsageAccountant {
    store: Arc<dyn UsageStore>,
    // serialises load-modify-save between the loop and command handlers
    lock: Arc<Mutex<()>>,
}

impl ApiUsageAccountant {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self {
            store,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn record_call(&self) -> Result<ApiUsage, StoreError> {
        self.record_call_at(Utc::now()).await
    }

    pub async fn usage(&self) -> Result<ApiUsage, StoreError> {
        self.usage_at(Utc::now()).await
    }

    /// Counts one outbound call made at `now`, resetting first if the
    /// month boundary has passed.
    pub async fn record_call_at(&self, now: DateTime<Utc>) -> Result<ApiUsage, StoreError> {
        let _guard = self.lock.lock().await;

        let current = self.store.load_usage().await?;
        let mut usage = roll_over(current, now);
        usage.count += 1;

        self.store.save_usage(usage).await?;
        Ok(usage)
    }

    pub async fn usage_at(&self, now: DateTime<Utc>) -> Result<ApiUsage, StoreError> {
        let _guard = self.lock.lock().await;

        let current = self.store.load_usage().await?;
        let usage = roll_over(current, now);

        if current != Some(usage) {
            self.store.save_usage(usage).await?;
        }
        Ok(usage)
    }
}

fn roll_over(current: Option<ApiUsage>, now: DateTime<Utc>) -> ApiUsage {
    match current {
        Some(u) if now.timestamp() < u.reset_at => u,
        _ => ApiUsage {
            count: 0,
            reset_at: next_reset_after(now).timestamp(),
        },
    }
}

/// 00:00:00 UTC on the first day of the month after `now`.
pub fn next_reset_after(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };

    let midnight = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(DateTime::UNIX_EPOCH.naive_utc());

    Utc.from_utc_datetime(&midnight)
}
