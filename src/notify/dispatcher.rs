// src/notify/dispatcher.rs
use std::sync::Arc;

use metrics::counter;

use super::format::{detail_message, summary_message};
use super::MessageSender;
use crate::error::{Error, Result};
use crate::marketplace::Reaction;

/// Outcome of a broadcast that reached at least one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub delivered: usize,
}

/// Fans one message out to every configured chat.
///
/// Every chat is attempted exactly once per call, failures included; the call
/// succeeds when at least one chat accepted the message.
#[derive(Clone)]
pub struct Dispatcher {
    chat_ids: Vec<String>,
    sender: Arc<dyn MessageSender>,
}

impl Dispatcher {
    pub fn new(chat_ids: Vec<String>, sender: Arc<dyn MessageSender>) -> Self {
        Self { chat_ids, sender }
    }

    pub fn chat_ids(&self) -> &[String] {
        &self.chat_ids
    }

    pub async fn broadcast(&self, text: &str) -> Result<BroadcastReport> {
        let attempted = self.chat_ids.len();
        let mut delivered = 0usize;
        let mut last_error: Option<Error> = None;

        for chat_id in &self.chat_ids {
            match self.sender.send_to(chat_id, text).await {
                Ok(()) => {
                    delivered += 1;
                    counter!("notifications_sent_total").increment(1);
                }
                Err(e) => {
                    tracing::warn!(chat_id = %chat_id, error = %e, "failed to send notification to chat");
                    counter!("notification_failures_total").increment(1);
                    last_error = Some(e);
                }
            }
        }

        if delivered == 0 {
            return Err(Error::AllDestinationsFailed {
                attempted,
                last_error: last_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no destinations configured".to_string()),
            });
        }
        Ok(BroadcastReport {
            attempted,
            delivered,
        })
    }

    pub async fn broadcast_summary(&self, questions: usize, feedbacks: usize) -> Result<BroadcastReport> {
        self.broadcast(&summary_message(questions, feedbacks)).await
    }

    pub async fn broadcast_reaction(&self, reaction: &Reaction) -> Result<BroadcastReport> {
        self.broadcast(&detail_message(reaction)).await
    }
}
