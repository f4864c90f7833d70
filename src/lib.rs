// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod inbound;
pub mod marketplace;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod ratelimit;
pub mod source;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::inbound::{InboundHandler, IpAllowlist, IpRange};
pub use crate::marketplace::{Marketplace, Reaction, ReactionKind};
pub use crate::monitor::{InboundOutcome, Monitor, MonitorStatus, StartOutcome, StopOutcome};
pub use crate::notify::{Dispatcher, MessageSender, TelegramSender};
pub use crate::ratelimit::{RateBudget, TokenBucket};
pub use crate::source::{MarketplaceClient, ReactionSource};
