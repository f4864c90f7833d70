// src/metrics.rs
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Only one recorder can exist per process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe();
        gauge!("monitor_running").set(0.0);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("poll_cycles_total", "Poll cycles executed");
    describe_counter!("reactions_found_total", "Unanswered reactions fetched, by kind");
    describe_counter!("fetch_errors_total", "Failed marketplace fetches, by kind");
    describe_counter!("notifications_sent_total", "Messages delivered to a chat");
    describe_counter!("notification_failures_total", "Messages that failed for a chat");
    describe_counter!("inbound_events_total", "Inbound push notifications, by type");
    describe_gauge!("monitor_running", "1 while the poll loop is running");
}
