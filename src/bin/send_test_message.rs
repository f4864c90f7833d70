//! Sends one test message to every configured Telegram chat, using the service's `.env`.
//! Usage: `send_test_message [note]`

use std::sync::Arc;

use marketplace_notifier::notify::format::test_message;
use marketplace_notifier::{Config, Dispatcher, TelegramSender};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = Config::from_env()?;
    let note = std::env::args().nth(1).unwrap_or_else(|| "test message".to_string());

    let sender = TelegramSender::new(&cfg.telegram)?;
    let dispatcher = Dispatcher::new(cfg.telegram.chat_ids.clone(), Arc::new(sender));

    let report = dispatcher.broadcast(&test_message(&note)).await?;
    println!(
        "delivered to {}/{} chats",
        report.delivered, report.attempted
    );
    Ok(())
}
