// Framework bootstrap for the snake server runtime.

use crate::frameworks::config;
use crate::interface_adapters::net::ws_handler;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{SessionRegistry, tick_task};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc, time::Duration};
use tokio::sync::{Mutex, Notify};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Serves the game on an already bound listener until ctrl-c.
pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    serve(listener, config::tick_interval()).await
}

/// Same as [`run`] with an explicit tick period, for callers that need a faster clock.
pub async fn serve(listener: tokio::net::TcpListener, tick_interval: Duration) -> Result<()> {
    let address = listener.local_addr()?;

    let sessions = Arc::new(Mutex::new(SessionRegistry::new(
        config::UPDATE_BROADCAST_CAPACITY,
    )));
    let shutdown = Arc::new(Notify::new());

    // One clock drives every active game.
    let ticker = tokio::spawn(tick_task(sessions.clone(), tick_interval, shutdown.clone()));

    let app = Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .with_state(AppState { sessions });

    tracing::info!(
        %address,
        tick_ms = tick_interval.as_millis() as u64,
        "listening"
    );

    // Serve app and report errors rather than panicking
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        });

    shutdown.notify_one();
    if let Err(e) = ticker.await {
        tracing::warn!(error = %e, "tick task did not stop cleanly");
    }
    tracing::info!("server stopped");
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::http_host(), config::http_port());

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        // Without a signal handler keep serving until the process is killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
