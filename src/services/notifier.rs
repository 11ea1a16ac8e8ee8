use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;

use crate::error::NotifyError;

/// Posts a message to a chat channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), NotifyError>;
}

/// Discord REST delivery (`POST /channels/{id}/messages`).
#[derive(Clone)]
pub struct DiscordNotifier {
    http: Client,
    token: String,
    api_base: String,
}

impl DiscordNotifier {
    pub fn new(token: String, api_base: String, timeout: Duration) -> Result<Self, NotifyError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            token,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel_id);

        let res = self
            .http
            .post(url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&json!({ "content": text }))
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }

        let body = res.text().await.unwrap_or_default();
        match status {
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Err(NotifyError::Unreachable(format!(
                "channel {channel_id}: {} {body}",
                status.as_u16()
            ))),
            _ => Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

/// Alert message text as posted to the channel.
pub fn alert_message(
    symbol: &str,
    owner_id: &str,
    percent_change: f64,
    new_price: f64,
    previous_price: f64,
) -> String {
    let direction = if percent_change > 0.0 { "📈" } else { "📉" };
    format!(
        "{direction} {symbol} price changed by {percent_change:+.2}%! \
         New price: ${new_price:.2} (Previous: ${previous_price:.2}) <@{owner_id}>"
    )
}
