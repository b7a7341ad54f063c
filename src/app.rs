/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - tracing / panic hook の初期化
 * - Authorization set: seed → initial IAM sync → periodic sync task
 * - gateway / admin listener を axum::serve() で起動 (Ctrl-C で graceful shutdown)
 */
use std::net::SocketAddr;
use std::sync::Arc;
use std::{panic, process};

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::services::{
    audit::TracingAuditSink,
    auth::build_authenticator,
    authz::{self, AuthzStore, IamClient, IdentitySource},
    upstream::{Dispatcher, RouteTable},
};
use crate::state::AppState;

fn init_tracing(ansi: bool) {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,admin_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    // Audit lines go to stderr together with everything else.
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(ansi),
        )
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // In development, fail fast. In production a panic only kills the
        // request task; the process keeps serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;

    init_tracing(!config.app_env.is_production());
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gateway in {:?} mode on {} (admin on {})",
        config.app_env,
        config.gateway_addr,
        config.admin_addr
    );

    let state = build_state(&config)?;

    for route in state.routes.routes() {
        tracing::info!(prefix = route.prefix(), upstream = %route.upstream(), "upstream route");
    }

    if !config.seed_users.is_empty() {
        state.authz.sync(config.seed_users.iter().cloned());
        tracing::info!(users = config.seed_users.len(), "authorization set seeded");
    }

    if let Err(err) = authz::sync_once(state.identity.as_ref(), &state.authz).await {
        tracing::warn!(error = %err, "initial authorization sync failed; continuing");
    }

    let sync_task = config.iam_sync_interval.map(|interval| {
        authz::spawn_periodic_sync(state.identity.clone(), state.authz.clone(), interval)
    });

    let gateway = api::gateway_router(state.clone(), config.request_body_limit);
    let admin = api::admin_router(state, config.request_body_limit);

    let gateway_listener = tokio::net::TcpListener::bind(config.gateway_addr)
        .await
        .with_context(|| format!("failed to bind gateway listener on {}", config.gateway_addr))?;
    let admin_listener = tokio::net::TcpListener::bind(config.admin_addr)
        .await
        .with_context(|| format!("failed to bind admin listener on {}", config.admin_addr))?;

    let gateway_server = axum::serve(
        gateway_listener,
        gateway.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());
    let admin_server = axum::serve(admin_listener, admin).with_graceful_shutdown(shutdown_signal());

    let served = tokio::try_join!(async { gateway_server.await }, async { admin_server.await });

    if let Some(task) = sync_task {
        task.abort();
    }
    served?;

    tracing::info!("gateway stopped");
    Ok(())
}

pub fn build_state(config: &Config) -> Result<AppState> {
    // Process-level services are built here and injected into AppState.
    let store = Arc::new(AuthzStore::new());
    let authenticator = build_authenticator(config, store, Arc::new(TracingAuditSink))
        .context("invalid token verification settings")?;

    let routes = Arc::new(RouteTable::new(config.routes.clone()));
    let dispatcher =
        Arc::new(Dispatcher::new(config.upstream_timeout).context("failed to build upstream client")?);

    let identity: Arc<dyn IdentitySource> = Arc::new(
        IamClient::new(&config.iam_url, config.upstream_timeout)
            .context("failed to build identity service client")?,
    );

    Ok(AppState::new(authenticator, routes, dispatcher, identity))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
