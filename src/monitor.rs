// src/monitor.rs
//! # Monitor
//! Poll/notify engine. Two states, Idle and Running:
//!
//! - `start` spawns one interval loop; calling it while running is a no-op.
//! - `stop` cancels the loop's token and returns without waiting for the task.
//! - The loop waits on "tick vs. cancelled"; a cycle already in flight runs to completion.
//!
//! A poll cycle fetches questions, then feedbacks, stamps `last_check_at` only if
//! both fetches succeeded, and broadcasts a summary followed by one detail
//! message per reaction. Notification failures are logged and never abort the cycle.
//!
//! All state sits behind one `RwLock`. Inbound feedback handling holds the write
//! lock for its whole fetch + broadcast sequence.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use crate::marketplace::yandex::{self, FeedbackCreated, NotificationBase};
use crate::marketplace::{Reaction, ReactionKind};
use crate::notify::Dispatcher;
use crate::source::ReactionSource;

/// Longest interval the loop honours; larger values are clamped.
pub const MAX_CHECK_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Engine state shared by the loop task, control handlers and status readers.
pub type SharedState = Arc<RwLock<EngineState>>;

/// `running == false` implies no loop task is active and no token is held.
#[derive(Debug, Default)]
pub struct EngineState {
    running: bool,
    last_check_at: Option<DateTime<Utc>>,
    last_discovery_at: Option<DateTime<Utc>>,
    cancel: Option<CancellationToken>,
}

/// Snapshot returned by [`Monitor::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonitorStatus {
    #[serde(rename = "isRunning")]
    pub running: bool,
    #[serde(rename = "lastCheck")]
    pub last_check_at: Option<DateTime<Utc>>,
    #[serde(rename = "lastUpdateDiscovered")]
    pub last_discovery_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Event type we do not act on (e.g. `PING`).
    Ignored { notification_type: String },
    FeedbackNotified { feedback_id: u64 },
}

/// What one poll cycle observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    pub questions: usize,
    pub feedbacks: usize,
    /// Both fetches succeeded.
    pub checked: bool,
    pub failed_notifications: usize,
}

#[derive(Clone)]
pub struct Monitor {
    state: SharedState,
    check_interval: Duration,
    source: Arc<dyn ReactionSource>,
    dispatcher: Dispatcher,
}

impl Monitor {
    pub fn new(config: &MonitorConfig, source: Arc<dyn ReactionSource>, dispatcher: Dispatcher) -> Self {
        Self {
            state: SharedState::default(),
            check_interval: config.check_interval.min(MAX_CHECK_INTERVAL),
            source,
            dispatcher,
        }
    }

    pub async fn start(&self) -> StartOutcome {
        let mut st = self.state.write().await;
        if st.running {
            info!("monitor already running");
            return StartOutcome::AlreadyRunning;
        }

        let cancel = CancellationToken::new();
        st.cancel = Some(cancel.clone());
        st.running = true;
        gauge!("monitor_running").set(1.0);
        info!(check_interval = ?self.check_interval, "starting monitor");

        let this = self.clone();
        tokio::spawn(async move { this.run(cancel).await });
        StartOutcome::Started
    }

    pub async fn stop(&self) -> StopOutcome {
        let mut st = self.state.write().await;
        if !st.running {
            info!("monitor is not running");
            return StopOutcome::NotRunning;
        }

        st.running = false;
        if let Some(cancel) = st.cancel.take() {
            cancel.cancel();
        }
        gauge!("monitor_running").set(0.0);
        info!("stopping monitor");
        StopOutcome::Stopped
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.running
    }

    pub async fn status(&self) -> MonitorStatus {
        let st = self.state.read().await;
        MonitorStatus {
            running: st.running,
            last_check_at: st.last_check_at,
            last_discovery_at: st.last_discovery_at,
        }
    }

    async fn run(self, cancel: CancellationToken) {
        // first tick one interval after start, like a plain ticker
        let now = Instant::now();
        let first = now.checked_add(self.check_interval).unwrap_or(now);
        let mut ticker = interval_at(first, self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("monitor stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }

    /// One poll cycle. Public so callers (and tests) can force a check.
    pub async fn run_cycle(&self) -> CycleReport {
        counter!("poll_cycles_total").increment(1);

        let questions = self.fetch(ReactionKind::Question).await;
        let feedbacks = self.fetch(ReactionKind::Feedback).await;
        let checked = questions.is_ok() && feedbacks.is_ok();
        let questions = questions.unwrap_or_default();
        let feedbacks = feedbacks.unwrap_or_default();

        let mut report = CycleReport {
            questions: questions.len(),
            feedbacks: feedbacks.len(),
            checked,
            failed_notifications: 0,
        };
        info!(
            questions = report.questions,
            feedbacks = report.feedbacks,
            checked,
            "poll cycle fetched"
        );

        let found = report.questions + report.feedbacks;
        {
            let mut st = self.state.write().await;
            if checked {
                st.last_check_at = Some(Utc::now());
            }
            if found > 0 {
                st.last_discovery_at = st.last_check_at;
            }
        }

        if found > 0 {
            match self
                .dispatcher
                .broadcast_summary(report.questions, report.feedbacks)
                .await
            {
                Ok(_) => info!("summary notification sent"),
                Err(e) => {
                    error!(error = %e, "failed to send summary notification");
                    report.failed_notifications += 1;
                }
            }
        }

        for reaction in questions.iter().chain(feedbacks.iter()) {
            if self.notify_reaction(reaction).await.is_err() {
                report.failed_notifications += 1;
            }
        }

        report
    }

    async fn fetch(&self, kind: ReactionKind) -> Result<Vec<Reaction>> {
        debug!(%kind, "checking for new reactions");
        match self.source.fetch_new(kind).await {
            Ok(found) => {
                counter!("reactions_found_total", "kind" => kind.as_str()).increment(found.len() as u64);
                Ok(found)
            }
            Err(e) => {
                error!(%kind, error = %e, "failed to check for new reactions");
                counter!("fetch_errors_total", "kind" => kind.as_str()).increment(1);
                Err(e)
            }
        }
    }

    async fn notify_reaction(&self, reaction: &Reaction) -> Result<()> {
        let id = reaction.id();
        let kind = reaction.kind();
        match self.dispatcher.broadcast_reaction(reaction).await {
            Ok(_) => {
                debug!(%kind, id = %id, "reaction notification sent");
                Ok(())
            }
            Err(e) => {
                error!(%kind, id = %id, error = %e, "failed to send reaction notification");
                Err(e)
            }
        }
    }

    /// Handle a raw push notification. Unknown types are acknowledged and ignored;
    /// a created feedback is fetched and broadcast, but only while running.
    pub async fn handle_inbound_notification(&self, raw: &[u8]) -> Result<InboundOutcome> {
        let base: NotificationBase =
            serde_json::from_slice(raw).map_err(|e| Error::MalformedPayload(e.to_string()))?;
        counter!("inbound_events_total", "type" => base.notification_type.clone()).increment(1);

        if base.notification_type != yandex::FEEDBACK_CREATED {
            debug!(notification_type = %base.notification_type, "ignoring inbound notification");
            return Ok(InboundOutcome::Ignored {
                notification_type: base.notification_type,
            });
        }

        let event: FeedbackCreated =
            serde_json::from_slice(raw).map_err(|e| Error::MalformedPayload(e.to_string()))?;

        let mut st = self.state.write().await;
        if !st.running {
            info!(feedback_id = event.feedback_id, "inbound feedback while monitor is not running");
            return Err(Error::EngineNotRunning);
        }

        info!(
            business_id = event.business_id,
            feedback_id = event.feedback_id,
            "new Yandex feedback notification"
        );
        let reaction = self
            .source
            .fetch_feedback(event.business_id, event.feedback_id)
            .await
            .inspect_err(|e| {
                error!(feedback_id = event.feedback_id, error = %e, "unable to fetch Yandex feedback");
            })?;

        st.last_discovery_at = Some(reaction.created_at().with_timezone(&Utc));

        self.notify_reaction(&reaction).await?;
        Ok(InboundOutcome::FeedbackNotified {
            feedback_id: event.feedback_id,
        })
    }
}
