//! Error types, one enum per boundary.

use thiserror::Error;

/// Startup configuration errors. All of these are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required setting {0} is missing")]
    Missing(&'static str),

    #[error("setting {name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("unknown store backend: {0}")]
    UnknownBackend(String),
}

/// Persistence errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("decode error: {0}")]
    Decode(String),
}

/// Outbound quote request errors.
#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("FINNHUB_API_KEY is missing")]
    MissingKey,

    #[error("quote request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("quote request failed: {status} {body}")]
    Status { status: u16, body: String },
}

/// Notification delivery errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("delivery request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("delivery rejected: {status} {body}")]
    Rejected { status: u16, body: String },

    #[error("channel unreachable: {0}")]
    Unreachable(String),
}

/// Watchlist command-side errors.
#[derive(Error, Debug)]
pub enum WatchlistError {
    #[error("threshold must be a positive number, got {0}")]
    InvalidThreshold(f64),

    #[error("channel id must not be empty")]
    InvalidChannel,

    #[error(transparent)]
    Store(#[from] StoreError),
}
