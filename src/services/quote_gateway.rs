use std::{sync::Arc, time::Duration};

use tokio::time;

use super::{api_usage::ApiUsageAccountant, finnhub::QuoteSource};

/// Bounded-retry price lookup on top of a [`QuoteSource`].
///
/// Never fails: bad symbols, HTTP errors and timeouts all end up as `None`
/// once the attempts run out. Every attempt is counted, successful or not.
#[derive(Clone)]
pub struct QuoteGateway {
    source: Arc<dyn QuoteSource>,
    usage: ApiUsageAccountant,
    max_attempts: u32,
    retry_delay: Duration,
}

impl QuoteGateway {
    pub fn new(
        source: Arc<dyn QuoteSource>,
        usage: ApiUsageAccountant,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            source,
            usage,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub fn usage(&self) -> &ApiUsageAccountant {
        &self.usage
    }

    pub async fn fetch_price(&self, symbol: &str) -> Option<f64> {
        for attempt in 1..=self.max_attempts {
            if let Err(e) = self.usage.record_call().await {
                tracing::warn!(symbol, error = %e, "could not record api call");
            }

            match self.source.quote(symbol).await {
                Ok(q) => match q.current_price() {
                    Some(price) => {
                        tracing::debug!(symbol, price, attempt, "quote ok");
                        return Some(price);
                    }
                    None => {
                        tracing::warn!(symbol, attempt, response = ?q, "quote has no valid price");
                    }
                },
                Err(e) => {
                    tracing::warn!(symbol, attempt, error = %e, "quote request failed");
                }
            }

            if attempt < self.max_attempts {
                time::sleep(self.retry_delay).await;
            }
        }

        tracing::error!(symbol, attempts = self.max_attempts, "giving up on quote");
        None
    }
}
