use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::{error::WatchlistError, store::WatchlistStore, AppState};

static SYMBOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9.:\-]{0,14}$").expect("symbol regex"));

#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    /// Newly tracked; the price is the first baseline.
    Added(f64),
    AlreadyTracked,
    /// Malformed symbol, or the quote API had no price for it.
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UntrackOutcome {
    Removed,
    NotTracked,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WatchlistView {
    pub scope_id: String,
    pub owner_id: String,
    pub threshold: f64,
    pub symbols: Vec<WatchedSymbol>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WatchedSymbol {
    pub symbol: String,
    pub last_price: Option<f64>,
}

/// Trims and uppercases a user-typed symbol. `None` if it can't be a ticker.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let sym = raw.trim().to_uppercase();
    SYMBOL_RE.is_match(&sym).then_some(sym)
}

pub async fn track(
    state: &AppState,
    scope_id: &str,
    owner_id: &str,
    symbol: &str,
) -> Result<TrackOutcome, WatchlistError> {
    let Some(sym) = normalize_symbol(symbol) else {
        return Ok(TrackOutcome::Invalid);
    };

    let existing = state.store.list_symbols(owner_id, scope_id).await?;
    if existing.contains_key(&sym) {
        return Ok(TrackOutcome::AlreadyTracked);
    }

    let Some(price) = state.quotes.fetch_price(&sym).await else {
        return Ok(TrackOutcome::Invalid);
    };

    if !state
        .store
        .add_symbol(scope_id, owner_id, &sym, Some(price))
        .await?
    {
        return Ok(TrackOutcome::AlreadyTracked);
    }

    tracing::info!(scope = %scope_id, owner = %owner_id, symbol = %sym, price, "symbol tracked");
    Ok(TrackOutcome::Added(price))
}

pub async fn untrack(
    state: &AppState,
    scope_id: &str,
    owner_id: &str,
    symbol: &str,
) -> Result<UntrackOutcome, WatchlistError> {
    let sym = symbol.trim().to_uppercase();

    if state.store.remove_symbol(scope_id, owner_id, &sym).await? {
        tracing::info!(scope = %scope_id, owner = %owner_id, symbol = %sym, "symbol untracked");
        Ok(UntrackOutcome::Removed)
    } else {
        Ok(UntrackOutcome::NotTracked)
    }
}

pub async fn set_threshold(
    state: &AppState,
    scope_id: &str,
    owner_id: &str,
    percent: f64,
) -> Result<(), WatchlistError> {
    if !percent.is_finite() || percent <= 0.0 {
        return Err(WatchlistError::InvalidThreshold(percent));
    }

    state.store.set_threshold(owner_id, scope_id, percent).await?;
    Ok(())
}

pub async fn bind_channel(
    state: &AppState,
    scope_id: &str,
    channel_id: &str,
) -> Result<(), WatchlistError> {
    let channel_id = channel_id.trim();
    if channel_id.is_empty() {
        return Err(WatchlistError::InvalidChannel);
    }

    state.store.bind_channel(scope_id, channel_id).await?;
    tracing::info!(scope = %scope_id, channel = %channel_id, "notification channel bound");
    Ok(())
}

pub async fn watchlist(
    state: &AppState,
    scope_id: &str,
    owner_id: &str,
) -> Result<WatchlistView, WatchlistError> {
    let threshold = state.store.get_threshold(owner_id, scope_id).await?;
    let symbols = state
        .store
        .list_symbols(owner_id, scope_id)
        .await?
        .into_iter()
        .map(|(symbol, last_price)| WatchedSymbol { symbol, last_price })
        .collect();

    Ok(WatchlistView {
        scope_id: scope_id.to_string(),
        owner_id: owner_id.to_string(),
        threshold,
        symbols,
    })
}

/// One-off price lookup (not persisted).
pub async fn quote(state: &AppState, symbol: &str) -> Option<(String, f64)> {
    let sym = normalize_symbol(symbol)?;
    let price = state.quotes.fetch_price(&sym).await?;
    Some((sym, price))
}
