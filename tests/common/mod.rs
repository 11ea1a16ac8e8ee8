#![allow(dead_code)]

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use stockwatch::{
    config::Settings,
    error::{NotifyError, QuoteError, StoreError},
    models::{ApiUsage, LeaderboardEntry},
    services::{
        api_usage::ApiUsageAccountant,
        finnhub::{QuoteResponse, QuoteSource},
        notifier::Notifier,
        quote_gateway::QuoteGateway,
    },
    store::{LeaderboardStore, MemoryStore, Store, UsageStore, WatchlistStore},
    AppState,
};
use tokio::sync::Notify;

/// Quote source with prices set by the test. Unknown symbols answer like
/// Finnhub does (all zeros); symbols marked failing return a 503.
#[derive(Default)]
pub struct ScriptedQuotes {
    prices: Mutex<HashMap<String, f64>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl ScriptedQuotes {
    pub fn set(&self, symbol: &str, price: f64) {
        self.prices.lock().unwrap().insert(symbol.to_string(), price);
    }

    pub fn fail(&self, symbol: &str) {
        self.failing.lock().unwrap().insert(symbol.to_string());
    }

    pub fn calls_for(&self, symbol: &str) -> usize {
        self.calls.lock().unwrap().get(symbol).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for ScriptedQuotes {
    async fn quote(&self, symbol: &str) -> Result<QuoteResponse, QuoteError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(symbol.to_string()).or_insert(0) += 1;

        if self.failing.lock().unwrap().contains(symbol) {
            return Err(QuoteError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        let price = self.prices.lock().unwrap().get(symbol).copied().unwrap_or(0.0);
        Ok(QuoteResponse {
            c: Some(price),
            ..Default::default()
        })
    }
}

/// Notifier that records every message, optionally refusing delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    unreachable: AtomicBool,
}

impl RecordingNotifier {
    pub fn go_unreachable(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), NotifyError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(NotifyError::Unreachable(channel_id.to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Quote source that prices `ready` symbols immediately and never answers
/// for `stalled`. `reached` fires once the stalled symbol is requested.
pub struct StallingQuotes {
    pub ready: HashMap<String, f64>,
    pub stalled: String,
    pub reached: Notify,
}

#[async_trait]
impl QuoteSource for StallingQuotes {
    async fn quote(&self, symbol: &str) -> Result<QuoteResponse, QuoteError> {
        if symbol == self.stalled {
            self.reached.notify_one();
            std::future::pending::<()>().await;
        }
        Ok(QuoteResponse {
            c: self.ready.get(symbol).copied(),
            ..Default::default()
        })
    }
}

fn injected(what: &str) -> StoreError {
    StoreError::Decode(format!("injected failure: {what}"))
}

/// `MemoryStore` with switchable failures on the reads and writes the
/// monitoring loop depends on.
#[derive(Default)]
pub struct FailingStore {
    pub inner: MemoryStore,
    scope_listing_failures: AtomicUsize,
    scope_listings: AtomicUsize,
    broken_channels: Mutex<HashSet<String>>,
    broken_owners: Mutex<HashSet<String>>,
    broken_baselines: Mutex<HashSet<String>>,
}

impl FailingStore {
    /// The next `times` scope listings fail.
    pub fn fail_scope_listing(&self, times: usize) {
        self.scope_listing_failures.store(times, Ordering::SeqCst);
    }

    pub fn scope_listings(&self) -> usize {
        self.scope_listings.load(Ordering::SeqCst)
    }

    pub fn break_channel_lookup(&self, scope_id: &str) {
        self.broken_channels.lock().unwrap().insert(scope_id.to_string());
    }

    pub fn break_threshold_lookup(&self, owner_id: &str) {
        self.broken_owners.lock().unwrap().insert(owner_id.to_string());
    }

    pub fn break_baseline_write(&self, symbol: &str) {
        self.broken_baselines.lock().unwrap().insert(symbol.to_string());
    }
}

#[async_trait]
impl WatchlistStore for FailingStore {
    async fn list_scopes_with_tracked_symbols(&self) -> Result<Vec<String>, StoreError> {
        self.scope_listings.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .scope_listing_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(injected("list scopes"));
        }
        self.inner.list_scopes_with_tracked_symbols().await
    }

    async fn list_owners_in_scope(&self, scope_id: &str) -> Result<Vec<String>, StoreError> {
        self.inner.list_owners_in_scope(scope_id).await
    }

    async fn get_threshold(&self, owner_id: &str, scope_id: &str) -> Result<f64, StoreError> {
        if self.broken_owners.lock().unwrap().contains(owner_id) {
            return Err(injected("threshold"));
        }
        self.inner.get_threshold(owner_id, scope_id).await
    }

    async fn list_symbols(
        &self,
        owner_id: &str,
        scope_id: &str,
    ) -> Result<BTreeMap<String, Option<f64>>, StoreError> {
        self.inner.list_symbols(owner_id, scope_id).await
    }

    async fn update_last_price(
        &self,
        owner_id: &str,
        scope_id: &str,
        symbol: &str,
        price: f64,
    ) -> Result<(), StoreError> {
        if self.broken_baselines.lock().unwrap().contains(symbol) {
            return Err(injected("baseline write"));
        }
        self.inner.update_last_price(owner_id, scope_id, symbol, price).await
    }

    async fn get_notification_channel(&self, scope_id: &str) -> Result<Option<String>, StoreError> {
        if self.broken_channels.lock().unwrap().contains(scope_id) {
            return Err(injected("channel"));
        }
        self.inner.get_notification_channel(scope_id).await
    }

    async fn add_symbol(
        &self,
        scope_id: &str,
        owner_id: &str,
        symbol: &str,
        price: Option<f64>,
    ) -> Result<bool, StoreError> {
        self.inner.add_symbol(scope_id, owner_id, symbol, price).await
    }

    async fn remove_symbol(
        &self,
        scope_id: &str,
        owner_id: &str,
        symbol: &str,
    ) -> Result<bool, StoreError> {
        self.inner.remove_symbol(scope_id, owner_id, symbol).await
    }

    async fn set_threshold(
        &self,
        owner_id: &str,
        scope_id: &str,
        percent: f64,
    ) -> Result<(), StoreError> {
        self.inner.set_threshold(owner_id, scope_id, percent).await
    }

    async fn bind_channel(&self, scope_id: &str, channel_id: &str) -> Result<(), StoreError> {
        self.inner.bind_channel(scope_id, channel_id).await
    }
}

#[async_trait]
impl UsageStore for FailingStore {
    async fn load_usage(&self) -> Result<Option<ApiUsage>, StoreError> {
        self.inner.load_usage().await
    }

    async fn save_usage(&self, usage: ApiUsage) -> Result<(), StoreError> {
        self.inner.save_usage(usage).await
    }
}

#[async_trait]
impl LeaderboardStore for FailingStore {
    async fn add_score(
        &self,
        date: &str,
        scope_id: &str,
        owner_id: &str,
        delta: f64,
    ) -> Result<(), StoreError> {
        self.inner.add_score(date, scope_id, owner_id, delta).await
    }

    async fn top_scores(
        &self,
        scope_id: &str,
        date: &str,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        self.inner.top_scores(scope_id, date, limit).await
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

pub fn test_settings() -> Settings {
    test_settings_with(&[])
}

/// Test defaults with some keys replaced or added.
pub fn test_settings_with(overrides: &[(&str, &str)]) -> Settings {
    let mut vars: HashMap<&str, &str> = HashMap::from([
        ("FINNHUB_API_KEY", "test-key"),
        ("DISCORD_BOT_TOKEN", "test-token"),
        ("STORE_BACKEND", "memory"),
        ("QUOTE_RETRY_DELAY_SECS", "0"),
        ("POLL_INTERVAL_SECS", "3600"),
    ]);
    vars.extend(overrides.iter().copied());
    Settings::from_lookup(|k: &str| vars.get(k).map(|v| v.to_string())).unwrap()
}

/// `AppState` over an arbitrary store and quote source.
pub fn state_with<S: Store + 'static>(
    settings: Settings,
    store: Arc<S>,
    source: Arc<dyn QuoteSource>,
    notifier: Arc<RecordingNotifier>,
) -> AppState {
    let usage: Arc<dyn UsageStore> = store.clone();
    let gateway = QuoteGateway::new(
        source,
        ApiUsageAccountant::new(usage),
        settings.quote_max_attempts,
        settings.quote_retry_delay,
    );
    let (events_tx, _events_rx) = tokio::sync::broadcast::channel::<String>(16);

    AppState {
        settings,
        store,
        quotes: gateway,
        notifier,
        events_tx,
    }
}

pub struct Harness {
    pub state: AppState,
    pub store: MemoryStore,
    pub quotes: Arc<ScriptedQuotes>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> Harness {
    harness_with(&[])
}

pub fn harness_with(overrides: &[(&str, &str)]) -> Harness {
    let store = MemoryStore::new();
    let quotes = Arc::new(ScriptedQuotes::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let state = state_with(
        test_settings_with(overrides),
        Arc::new(store.clone()),
        quotes.clone(),
        notifier.clone(),
    );

    Harness {
        state,
        store,
        quotes,
        notifier,
    }
}

/// Harness over a [`FailingStore`]; `Harness::store` is its inner store.
pub fn failing_harness(overrides: &[(&str, &str)]) -> (Harness, Arc<FailingStore>) {
    let failing = Arc::new(FailingStore::default());
    let quotes = Arc::new(ScriptedQuotes::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let state = state_with(
        test_settings_with(overrides),
        failing.clone(),
        quotes.clone(),
        notifier.clone(),
    );

    let harness = Harness {
        state,
        store: failing.inner.clone(),
        quotes,
        notifier,
    };
    (harness, failing)
}
