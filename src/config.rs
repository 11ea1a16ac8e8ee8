use std::{env, path::PathBuf, time::Duration};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub store_backend: StoreBackend,
    pub host: String,
    pub port: u16,

    pub finnhub_api_key: String,
    pub finnhub_base_url: String,

    pub discord_bot_token: String,
    pub discord_api_base: String,

    pub poll_interval: Duration,
    pub quote_max_attempts: u32,
    pub quote_retry_delay: Duration,
    pub quote_timeout: Duration,

    pub command_prefix: String,
    /// Shared secret for `POST /commands` and `GET /logs`. Unset means open.
    pub command_token: Option<String>,

    pub log_file: PathBuf,
    pub log_tail_lines: usize,
}

pub fn load() -> Result<Settings, ConfigError> {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    Settings::from_lookup(|name| env::var(name).ok())
}

impl Settings {
    /// Builds settings from an arbitrary key lookup.
    ///
    /// `load()` feeds it the process environment; tests feed it a map.
    pub fn from_lookup<F>(get: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default = |name: &str, default: &str| {
            get(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let finnhub_api_key = required(&get, "FINNHUB_API_KEY")?;
        let discord_bot_token = required(&get, "DISCORD_BOT_TOKEN")?;

        let store_backend = match or_default("STORE_BACKEND", "mongo").to_lowercase().as_str() {
            "mongo" | "mongodb" => StoreBackend::Mongo,
            "memory" => StoreBackend::Memory,
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        Ok(Settings {
            mongodb_uri: or_default("MONGODB_URI", "mongodb://localhost:27017"),
            mongodb_db: or_default("MONGODB_DB", "stockwatch"),
            store_backend,
            host: or_default("HOST", "127.0.0.1"),
            port: parsed(&get, "PORT", 3000)?,

            finnhub_api_key,
            finnhub_base_url: or_default("FINNHUB_BASE_URL", "https://finnhub.io/api/v1"),

            discord_bot_token,
            discord_api_base: or_default("DISCORD_API_BASE", "https://discord.com/api/v10"),

            poll_interval: Duration::from_secs(positive(&get, "POLL_INTERVAL_SECS", 1800)?),
            quote_max_attempts: parsed::<u32, _>(&get, "QUOTE_MAX_ATTEMPTS", 3)?.max(1),
            quote_retry_delay: Duration::from_secs(parsed(&get, "QUOTE_RETRY_DELAY_SECS", 2)?),
            quote_timeout: Duration::from_secs(parsed(&get, "QUOTE_TIMEOUT_SECS", 10)?),

            command_prefix: or_default("COMMAND_PREFIX", "!"),
            command_token: get("COMMAND_TOKEN")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),

            log_file: PathBuf::from(or_default("LOG_FILE", "stockwatch.log")),
            log_tail_lines: parsed(&get, "LOG_TAIL_LINES", 200)?,
        })
    }
}

fn required<F>(get: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<T, F>(get: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match get(name).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
    }
}

// zero would turn the poll loop into a busy loop over the quote budget
fn positive<F>(get: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parsed(get, name, default)? {
        0 => Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
        }),
        n => Ok(n),
    }
}
