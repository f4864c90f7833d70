// src/source/mod.rs
pub mod client;

pub use client::MarketplaceClient;

use crate::error::Result;
use crate::marketplace::{Reaction, ReactionKind};

/// Where the monitor gets reactions from.
#[async_trait::async_trait]
pub trait ReactionSource: Send + Sync {
    /// Unanswered reactions of `kind`, in upstream order, at most the configured ceiling.
    async fn fetch_new(&self, kind: ReactionKind) -> Result<Vec<Reaction>>;

    /// A single feedback referenced by an inbound push notification.
    async fn fetch_feedback(&self, business_id: u64, feedback_id: u64) -> Result<Reaction>;
}
