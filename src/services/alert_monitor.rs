use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time,
};

use crate::{
    error::StoreError,
    events::AlertEvent,
    store::{Store, WatchlistStore},
    AppState,
};

use super::{
    evaluator::evaluate,
    leaderboard_service,
    notifier::{alert_message, Notifier},
    quote_gateway::QuoteGateway,
};

/// Counters for one pass over every scope, owner and symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub scopes_visited: usize,
    pub scopes_skipped: usize,
    pub symbols_priced: usize,
    pub symbols_failed: usize,
    pub alerts_sent: usize,
    pub delivery_failures: usize,
    pub item_errors: usize,
}

/// The watchlist monitoring loop.
///
/// Each cycle re-prices every tracked symbol in every scope that has a bound
/// notification channel, alerts on threshold crossings and stores the new
/// baseline. Cycles never overlap: the next one starts only after the
/// previous one finished and the poll interval elapsed.
#[derive(Clone)]
pub struct AlertMonitor {
    store: Arc<dyn Store>,
    quotes: QuoteGateway,
    notifier: Arc<dyn Notifier>,
    events_tx: broadcast::Sender<String>,
    interval: Duration,
}

impl AlertMonitor {
    pub fn new(
        store: Arc<dyn Store>,
        quotes: QuoteGateway,
        notifier: Arc<dyn Notifier>,
        events_tx: broadcast::Sender<String>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            quotes,
            notifier,
            events_tx,
            interval,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.store.clone(),
            state.quotes.clone(),
            state.notifier.clone(),
            state.events_tx.clone(),
            state.settings.poll_interval,
        )
    }

    /// Runs cycles until `shutdown` flips to true (or its sender is dropped).
    ///
    /// Shutdown interrupts a sleep or an in-flight cycle at its next await
    /// point; per-symbol writes that already completed stay committed.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(interval_secs = self.interval.as_secs(), "alert monitor started");

            while !*shutdown.borrow() {
                tokio::select! {
                    res = self.run_cycle() => match res {
                        Ok(report) => tracing::info!(?report, "monitor cycle complete"),
                        Err(e) => tracing::error!(error = %e, "monitor cycle aborted"),
                    },
                    _ = shutdown.changed() => break,
                }

                tokio::select! {
                    _ = time::sleep(self.interval) => {}
                    _ = shutdown.changed() => break,
                }
            }

            tracing::info!("alert monitor stopped");
        })
    }

    /// One full cycle. Only a failure to enumerate scopes aborts it; anything
    /// below that is logged and skipped.
    pub async fn run_cycle(&self) -> Result<CycleReport, StoreError> {
        let mut report = CycleReport::default();
        let scopes = self.store.list_scopes_with_tracked_symbols().await?;
        let date = leaderboard_service::today();

        for scope_id in scopes {
            if let Err(e) = self.run_scope(&scope_id, &date, &mut report).await {
                report.item_errors += 1;
                tracing::error!(scope = %scope_id, error = %e, "scope failed");
            }
        }

        Ok(report)
    }

    async fn run_scope(
        &self,
        scope_id: &str,
        date: &str,
        report: &mut CycleReport,
    ) -> Result<(), StoreError> {
        // no channel bound: nothing is fetched or written for this scope
        let Some(channel_id) = self.store.get_notification_channel(scope_id).await? else {
            report.scopes_skipped += 1;
            tracing::debug!(scope = %scope_id, "no notification channel; skipping scope");
            return Ok(());
        };
        report.scopes_visited += 1;

        for owner_id in self.store.list_owners_in_scope(scope_id).await? {
            if let Err(e) = self
                .run_owner(scope_id, &channel_id, &owner_id, date, report)
                .await
            {
                report.item_errors += 1;
                tracing::error!(scope = %scope_id, owner = %owner_id, error = %e, "owner failed");
            }
        }

        Ok(())
    }

    async fn run_owner(
        &self,
        scope_id: &str,
        channel_id: &str,
        owner_id: &str,
        date: &str,
        report: &mut CycleReport,
    ) -> Result<(), StoreError> {
        let threshold = self.store.get_threshold(owner_id, scope_id).await?;
        let symbols = self.store.list_symbols(owner_id, scope_id).await?;

        let mut changes = Vec::new();

        for (symbol, last_price) in symbols {
            let Some(price) = self.quotes.fetch_price(&symbol).await else {
                report.symbols_failed += 1;
                continue;
            };
            report.symbols_priced += 1;

            let eval = evaluate(last_price, price, threshold);

            if let Some(pct) = eval.percent_change {
                changes.push(pct);

                if eval.alert {
                    // percent_change is only Some when a positive baseline exists
                    let previous = last_price.unwrap_or_default();
                    self.notify(channel_id, scope_id, owner_id, &symbol, pct, price, previous, report)
                        .await;
                }
            }

            if let Err(e) = self
                .store
                .update_last_price(owner_id, scope_id, &symbol, price)
                .await
            {
                report.item_errors += 1;
                tracing::error!(
                    scope = %scope_id, owner = %owner_id, symbol = %symbol, error = %e,
                    "could not store baseline"
                );
            }
        }

        if let Err(e) =
            leaderboard_service::record_performance(self.store.as_ref(), date, scope_id, owner_id, &changes)
                .await
        {
            tracing::warn!(scope = %scope_id, owner = %owner_id, error = %e, "leaderboard update failed");
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn notify(
        &self,
        channel_id: &str,
        scope_id: &str,
        owner_id: &str,
        symbol: &str,
        percent_change: f64,
        price: f64,
        previous: f64,
        report: &mut CycleReport,
    ) {
        let text = alert_message(symbol, owner_id, percent_change, price, previous);

        match self.notifier.send(channel_id, &text).await {
            Ok(()) => {
                report.alerts_sent += 1;
                tracing::info!(scope = %scope_id, owner = %owner_id, symbol, percent_change, "alert sent");
            }
            Err(e) => {
                report.delivery_failures += 1;
                tracing::warn!(
                    scope = %scope_id, channel = %channel_id, symbol, error = %e,
                    "alert delivery failed"
                );
            }
        }

        let event = AlertEvent {
            scope_id: scope_id.to_string(),
            owner_id: owner_id.to_string(),
            symbol: symbol.to_string(),
            percent_change,
            price,
            previous_price: previous,
        };
        // no subscribers is fine
        let _ = self.events_tx.send(event.to_json());
    }
}
