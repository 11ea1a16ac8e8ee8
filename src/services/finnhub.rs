use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;

/// Raw price source. One call is one outbound request.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<QuoteResponse, QuoteError>;
}

#[derive(Clone)]
pub struct FinnhubClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl FinnhubClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, QuoteError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[async_trait]
impl QuoteSource for FinnhubClient {
    async fn quote(&self, symbol: &str) -> Result<QuoteResponse, QuoteError> {
        if !self.has_key() {
            return Err(QuoteError::MissingKey);
        }

        let url = format!("{}/quote", self.base_url);
        let res = self
            .http
            .get(url)
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(QuoteError::Status { status, body });
        }

        Ok(res.json::<QuoteResponse>().await?)
    }
}

/// Finnhub `/quote` body. Unknown symbols come back as all zeros,
/// so every field is optional and validated by the caller.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct QuoteResponse {
    // current
    #[serde(default)]
    pub c: Option<f64>,
    // change
    #[serde(default)]
    pub d: Option<f64>,
    // percent change
    #[serde(default)]
    pub dp: Option<f64>,
    // high
    #[serde(default)]
    pub h: Option<f64>,
    // low
    #[serde(default)]
    pub l: Option<f64>,
    // open
    #[serde(default)]
    pub o: Option<f64>,
    // previous close
    #[serde(default)]
    pub pc: Option<f64>,
    // timestamp
    #[serde(default)]
    pub t: Option<i64>,
}

impl QuoteResponse {
    /// Current price, if it is a usable (finite, positive) number.
    pub fn current_price(&self) -> Option<f64> {
        self.c.filter(|p| p.is_finite() && *p > 0.0)
    }
}
