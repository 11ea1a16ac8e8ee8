//! Library entrypoint for stockwatch.
//!
//! `main.rs` wires the real collaborators together; integration tests under
//! `tests/` build an `AppState` around in-memory ones.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod store;

pub mod services;

pub mod commands;
pub mod events;

pub mod controllers;
pub mod middleware;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub store: Arc<dyn store::Store>,
    pub quotes: services::quote_gateway::QuoteGateway,
    pub notifier: Arc<dyn services::notifier::Notifier>,
    pub events_tx: tokio::sync::broadcast::Sender<String>,
}
