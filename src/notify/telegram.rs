// src/notify/telegram.rs
use reqwest::Client;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::format::PARSE_MODE;
use super::MessageSender;
use crate::config::TelegramConfig;
use crate::error::{Error, Result};
use crate::ratelimit::TokenBucket;

/// Telegram Bot API `sendMessage` client, throttled by its own token bucket.
pub struct TelegramSender {
    client: Client,
    send_url: String,
    limiter: TokenBucket,
    shutdown: CancellationToken,
}

#[derive(Debug, Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

impl TelegramSender {
    pub fn new(cfg: &TelegramConfig) -> Result<Self> {
        let client = Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            client,
            send_url: format!(
                "{}/bot{}/sendMessage",
                cfg.api_base_url.trim_end_matches('/'),
                cfg.bot_token
            ),
            limiter: TokenBucket::new(cfg.rate),
            shutdown: CancellationToken::new(),
        })
    }

    /// Token whose cancellation aborts pending rate-limit waits (process shutdown).
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

#[async_trait::async_trait]
impl MessageSender for TelegramSender {
    async fn send_to(&self, chat_id: &str, text: &str) -> Result<()> {
        self.limiter.acquire(&self.shutdown).await?;

        let message = TelegramMessage {
            chat_id,
            text,
            parse_mode: PARSE_MODE,
        };
        let resp = self.client.post(&self.send_url).json(&message).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await.unwrap_or_default();
            return Err(Error::upstream(status, &body));
        }
        tracing::debug!(chat_id, "telegram message delivered");
        Ok(())
    }
}
