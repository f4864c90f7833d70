//! Marketplace notifier: binary entrypoint.
//! Boots the poll/notify monitor (idle until `/start`) and the axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use marketplace_notifier::{
    metrics::Metrics, router, AppState, Config, Dispatcher, InboundHandler, MarketplaceClient,
    Monitor, TelegramSender,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("marketplace_notifier=info,tower_http=info,warn"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Config::from_env()?;
    let shutdown = CancellationToken::new();

    let source = MarketplaceClient::new(&cfg.marketplaces)
        .context("building marketplace client")?
        .with_shutdown(shutdown.clone());
    let sender = TelegramSender::new(&cfg.telegram)
        .context("building telegram client")?
        .with_shutdown(shutdown.clone());
    let dispatcher = Dispatcher::new(cfg.telegram.chat_ids.clone(), Arc::new(sender));

    let monitor = Monitor::new(&cfg.monitor, Arc::new(source), dispatcher);
    let inbound = InboundHandler::new(cfg.inbound.to_allowlist(), monitor.clone());

    let metrics = Metrics::init()?;

    let state = AppState {
        monitor: monitor.clone(),
        inbound,
        control_token: Arc::from(cfg.server.control_token.as_str()),
        trust_forwarded_for: cfg.inbound.trust_forwarded_for,
    };
    let app = router(state).merge(metrics.router());

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, chats = cfg.telegram.chat_ids.len(), "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await
    .context("http server")?;

    monitor.stop().await;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
    shutdown.cancel();
}
