// src/api.rs
//! HTTP surface: health, status, start/stop control and the inbound push endpoint.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body,
    extract::{ConnectInfo, Query, Request, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::Error;
use crate::inbound::InboundHandler;
use crate::monitor::{Monitor, MonitorStatus, StartOutcome, StopOutcome};

/// Inbound pushes are tiny; anything larger is rejected.
const MAX_INBOUND_BODY: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub monitor: Monitor,
    pub inbound: InboundHandler,
    pub control_token: Arc<str>,
    pub trust_forwarded_for: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/info", get(info))
        .route("/start", post(start))
        .route("/stop", post(stop))
        .route("/api/notification", post(notification))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct MessageOut {
    message: &'static str,
}

fn message(status: StatusCode, message: &'static str) -> Response {
    (status, Json(MessageOut { message })).into_response()
}

#[derive(Deserialize)]
struct TokenQuery {
    #[serde(default)]
    token: Option<String>,
}

impl TokenQuery {
    fn matches(&self, expected: &str) -> bool {
        self.token.as_deref() == Some(expected)
    }
}

async fn info(State(state): State<AppState>) -> Json<MonitorStatus> {
    Json(state.monitor.status().await)
}

async fn start(State(state): State<AppState>, Query(q): Query<TokenQuery>) -> Response {
    if !q.matches(&state.control_token) {
        tracing::warn!("start rejected: bad control token");
        return message(StatusCode::UNAUTHORIZED, "invalid token");
    }
    match state.monitor.start().await {
        StartOutcome::Started => message(StatusCode::OK, "started running"),
        StartOutcome::AlreadyRunning => message(StatusCode::OK, "already running"),
    }
}

async fn stop(State(state): State<AppState>, Query(q): Query<TokenQuery>) -> Response {
    if !q.matches(&state.control_token) {
        tracing::warn!("stop rejected: bad control token");
        return message(StatusCode::UNAUTHORIZED, "invalid token");
    }
    match state.monitor.stop().await {
        StopOutcome::Stopped => message(StatusCode::OK, "running stops..."),
        StopOutcome::NotRunning => message(StatusCode::OK, "monitor is not running"),
    }
}

async fn notification(State(state): State<AppState>, req: Request) -> Response {
    let Some(origin) = client_ip(&req, state.trust_forwarded_for) else {
        return message(StatusCode::FORBIDDEN, "forbidden");
    };
    // reject unknown callers before reading their body
    if let Err(e) = state.inbound.check_origin(origin) {
        return error_response(&e);
    }

    let raw = match body::to_bytes(req.into_body(), MAX_INBOUND_BODY).await {
        Ok(b) => b,
        Err(_) => return message(StatusCode::BAD_REQUEST, "invalid body"),
    };

    match state.inbound.handle(origin, &raw).await {
        Ok(_) => message(StatusCode::OK, "success"),
        Err(e) => error_response(&e),
    }
}

fn error_response(e: &Error) -> Response {
    match e {
        Error::Forbidden(_) => message(StatusCode::FORBIDDEN, "forbidden"),
        Error::MalformedPayload(_) => message(StatusCode::BAD_REQUEST, "malformed payload"),
        Error::EngineNotRunning => message(StatusCode::CONFLICT, "monitor is not running"),
        _ => message(StatusCode::BAD_GATEWAY, "error while processing notification"),
    }
}

/// Caller address: the socket peer, or the first forwarded hop when proxies are trusted.
fn client_ip(req: &Request, trust_forwarded_for: bool) -> Option<IpAddr> {
    if trust_forwarded_for {
        if let Some(ip) = forwarded_ip(req.headers()) {
            return Some(ip);
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let first_forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok());
    first_forwarded.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    })
}
