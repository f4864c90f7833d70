// src/ratelimit.rs
//! Token-bucket limiter shared by every call to one outbound resource.
//!
//! - Capacity = `burst`, refilled continuously at `per_second` tokens/second.
//! - A full bucket lets `burst` calls through without waiting.
//! - Waiters sleep until the next token is due; there is no FIFO among them.
//! - Waiting is abandoned as soon as the caller's `CancellationToken` fires.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Lowest refill rate we accept; keeps wait computations finite.
const MIN_RATE_PER_SEC: f64 = 0.001;

/// Rate budget of one limited resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateBudget {
    pub per_second: f64,
    pub burst: u32,
}

impl RateBudget {
    pub const fn new(per_second: f64, burst: u32) -> Self {
        Self { per_second, burst }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    bucket: Mutex<Bucket>,
}

impl TokenBucket {
    /// `burst` of 0 is treated as 1; non-positive rates are clamped to a tiny positive rate.
    pub fn new(budget: RateBudget) -> Self {
        let capacity = f64::from(budget.burst.max(1));
        let rate = if budget.per_second.is_finite() {
            budget.per_second.max(MIN_RATE_PER_SEC)
        } else {
            MIN_RATE_PER_SEC
        };
        Self {
            rate,
            capacity,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take one token if available right now.
    pub fn try_acquire(&self) -> bool {
        self.reserve().is_none()
    }

    /// Wait for one token.
    ///
    /// Fails with [`Error::RateLimitCancelled`] if `cancel` is (or becomes) cancelled
    /// before a token is granted.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(Error::RateLimitCancelled);
            }
            let Some(wait) = self.reserve() else {
                return Ok(());
            };
            tracing::trace!(wait_ms = wait.as_millis() as u64, "rate limiter: waiting for token");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::RateLimitCancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Either consumes a token (`None`) or returns how long until one is due.
    fn reserve(&self) -> Option<Duration> {
        let mut b = self.bucket.lock();
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(b.last_refill).as_secs_f64();
        b.tokens = (b.tokens + elapsed * self.rate).min(self.capacity);
        b.last_refill = now;

        if b.tokens >= 1.0 {
            b.tokens -= 1.0;
            return None;
        }
        let missing = 1.0 - b.tokens;
        Some(Duration::from_secs_f64(missing / self.rate))
    }
}
