use super::handlers::{handle_alarms, handle_health, handle_interactions};
use super::replay_guard::InteractionGuard;
use super::{AppState, MAX_BODY_SIZE, REQUEST_TIMEOUT_SECS};

use crate::app::runtime::Runtime;
use crate::autoshutdown::AlarmHandler;
use crate::config::Config;
use crate::transport::discord::parse_public_key;
use anyhow::{Context, Result};
use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Returns true when the bind address is not a loopback address.
fn is_public_bind(host: &str) -> bool {
    !matches!(
        host,
        "127.0.0.1" | "localhost" | "::1" | "[::1]" | "0:0:0:0:0:0:0:1"
    )
}

/// Run the HTTP gateway using axum with proper HTTP/1.1 compliance.
pub async fn run_gateway(host: &str, port: u16, config: Arc<Config>) -> Result<()> {
    // ── Security: refuse public bind without explicit opt-in ──
    if is_public_bind(host) && !config.gateway.allow_public_bind {
        anyhow::bail!(
            "Refusing to bind to {host}: gateway would be exposed to the internet.\n\
             Fix: use --host 127.0.0.1 (default) behind a reverse proxy, or set\n\
             [gateway] allow_public_bind = true in config.toml."
        );
    }

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("parse gateway bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind gateway socket")?;

    run_gateway_with_listener(host, listener, config).await
}

async fn build_gateway_state(config: &Config) -> Result<AppState> {
    let runtime = Runtime::build(config.clone()).await?;

    let public_key = runtime
        .config
        .discord
        .public_key
        .as_deref()
        .context("discord.public_key is required to serve interactions")?;
    let public_key = parse_public_key(public_key).context("parse discord.public_key")?;
    let runner = runtime.workflow_runner()?;

    let alarms = if runtime.config.auto_shutdown.enabled {
        let handler = AlarmHandler::new(
            Arc::clone(&runtime.ecs),
            runtime.config.service.cluster.clone(),
            runtime.config.service.service.clone(),
            Duration::from_secs(runtime.config.service.timeout_secs),
        )?
        .with_secret(runtime.config.auto_shutdown.secret.clone())
        .with_topic_arn(runtime.config.auto_shutdown.topic_arn.clone());
        Some(Arc::new(handler))
    } else {
        None
    };

    Ok(AppState {
        public_key: Arc::new(public_key),
        runner: Arc::new(runner),
        interactions: Arc::new(InteractionGuard::new()),
        alarms,
    })
}

/// Run the HTTP gateway from a pre-bound listener.
pub async fn run_gateway_with_listener(
    host: &str,
    listener: tokio::net::TcpListener,
    config: Arc<Config>,
) -> Result<()> {
    let actual_port = listener
        .local_addr()
        .context("get gateway listener local address")?
        .port();
    let display_addr = format!("{host}:{actual_port}");

    let state = build_gateway_state(&config).await?;
    print_gateway_banner(&display_addr, state.alarms.is_some());

    let app = build_app(state);
    axum::serve(listener, app)
        .await
        .context("serve HTTP gateway")?;

    Ok(())
}

fn print_gateway_banner(display_addr: &str, alarms_enabled: bool) {
    println!("Gateway listening on {display_addr}");
    println!("  POST /interactions");
    if alarms_enabled {
        println!("  POST /alarms");
    }
    println!("  GET  /health");
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/interactions", post(handle_interactions))
        .route("/alarms", post(handle_alarms))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}
