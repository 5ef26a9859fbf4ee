//! monigate gateway binary.
//!
//! Loads config (file + environment), builds the shared state, and serves the
//! monitoring API until Ctrl-C / SIGTERM.

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use monigate_core::error::{MonigateError, Result};
use monigate_gateway::{app_state, config, router};

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = config::load_from_env()?;
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| MonigateError::Config(format!("gateway.listen: {e}")))?;

    if cfg.gateway.jwt_secret.is_some() {
        tracing::warn!(
            "jwt_secret is configured but unused: API tokens are matched against the credential table, not verified"
        );
    }

    let state = app_state::AppState::new(cfg)?;
    let _sweeper = state.spawn_limiter_sweeper();
    let app = router::build_router(state.clone());

    tracing::info!(
        %listen,
        instance = %state.cfg().gateway.instance_name,
        artifacts = %state.artifacts().dir().display(),
        credentials = state.cfg().credentials.len(),
        "monigate-gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| MonigateError::Io(format!("bind {listen}: {e}")))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| MonigateError::Io(format!("server failed: {e}")))?;

    tracing::info!("monigate-gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl-c handler failed");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler failed");
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
    tracing::info!("shutdown signal received, draining");
}
