use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use mongodb::Client;
use tokio::sync::{broadcast, watch};

use stockwatch::{
    config::{self, StoreBackend},
    logging,
    routes,
    services::{
        alert_monitor::AlertMonitor,
        api_usage::ApiUsageAccountant,
        db_init,
        finnhub::FinnhubClient,
        notifier::DiscordNotifier,
        quote_gateway::QuoteGateway,
    },
    store::{MemoryStore, MongoStore, Store, UsageStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = config::load().context("invalid configuration")?;
    let _log_guard = logging::init(&settings.log_file);
    tracing::info!(log_file = %settings.log_file.display(), "logging initialised");

    let (store, usage_store): (Arc<dyn Store>, Arc<dyn UsageStore>) = match settings.store_backend {
        StoreBackend::Mongo => {
            let client = Client::with_uri_str(&settings.mongodb_uri)
                .await
                .context("failed to connect to MongoDB")?;
            let db = client.database(&settings.mongodb_db);

            db_init::ensure_indexes(&db)
                .await
                .context("failed to create MongoDB indexes")?;

            let store = MongoStore::new(db);
            let usage: Arc<dyn UsageStore> = Arc::new(store.clone());
            let store: Arc<dyn Store> = Arc::new(store);
            (store, usage)
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; nothing survives a restart");
            let store = MemoryStore::new();
            let usage: Arc<dyn UsageStore> = Arc::new(store.clone());
            let store: Arc<dyn Store> = Arc::new(store);
            (store, usage)
        }
    };

    store.ping().await.context("store is not reachable")?;
    tracing::info!(backend = ?settings.store_backend, "store ready");

    let finnhub = FinnhubClient::new(
        settings.finnhub_api_key.clone(),
        settings.finnhub_base_url.clone(),
        settings.quote_timeout,
    )
    .context("failed to build quote client")?;

    let notifier = DiscordNotifier::new(
        settings.discord_bot_token.clone(),
        settings.discord_api_base.clone(),
        settings.quote_timeout,
    )
    .context("failed to build notifier")?;

    let quotes = QuoteGateway::new(
        Arc::new(finnhub),
        ApiUsageAccountant::new(usage_store),
        settings.quote_max_attempts,
        settings.quote_retry_delay,
    );

    let (events_tx, _events_rx) = broadcast::channel::<String>(64);

    let state = AppState {
        settings: settings.clone(),
        store,
        quotes,
        notifier: Arc::new(notifier),
        events_tx,
    };

    if settings.command_token.is_none() {
        tracing::warn!("COMMAND_TOKEN is not set; /commands and /logs accept any caller");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = AlertMonitor::from_state(&state).spawn(shutdown_rx);

    let app = routes::app(state);

    let ip = settings
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("invalid HOST {}", settings.host))?;
    let addr = SocketAddr::from((ip, settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .context("server error")?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = monitor.await {
        tracing::error!(error = %e, "alert monitor task failed");
    }

    Ok(())
}
