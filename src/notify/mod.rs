// src/notify/mod.rs
//! Outbound notifications: message formatting, chat transport and fan-out.

pub mod dispatcher;
pub mod format;
pub mod telegram;

pub use dispatcher::{BroadcastReport, Dispatcher};
pub use telegram::TelegramSender;

use crate::error::Result;

/// Delivers one already-rendered message to one destination chat.
#[async_trait::async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_to(&self, chat_id: &str, text: &str) -> Result<()>;
}
