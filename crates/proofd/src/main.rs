mod routes;
mod store;

use anyhow::{Context, Result};
use hyper::server::Server;
use hyper::service::{make_service_fn, service_fn};
use proofd_core::api::DEFAULT_PORT;
use proofd_core::config::Config;
use routes::AppState;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use store::SettingsStore;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

/// Listen address from `PROOFD_HOST` / `PROOFD_PORT`.
fn listen_addr() -> Result<SocketAddr> {
    let host = match std::env::var("PROOFD_HOST") {
        Ok(host) => host
            .parse::<IpAddr>()
            .with_context(|| format!("parsing PROOFD_HOST '{host}'"))?,
        Err(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
    };
    let port = match std::env::var("PROOFD_PORT") {
        Ok(port) => port
            .parse::<u16>()
            .with_context(|| format!("parsing PROOFD_PORT '{port}'"))?,
        Err(_) => DEFAULT_PORT,
    };
    Ok(SocketAddr::new(host, port))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("proofd=info".parse()?),
        )
        .init();

    info!("proofd starting");

    let store = SettingsStore::new(Config::settings_path());
    if let Err(e) = store.ensure_initialized() {
        warn!(error = %e, "could not create settings, defaults will be served");
    }
    info!(path = %store.path().display(), "settings store ready");

    let state = Arc::new(AppState::new(store));
    let make_svc = make_service_fn(move |_conn| {
        let state = Arc::clone(&state);
        async move {
            Ok::<_, Infallible>(service_fn(move |req| routes::handle(req, Arc::clone(&state))))
        }
    });

    let addr = listen_addr()?;
    let server = Server::try_bind(&addr)
        .with_context(|| format!("binding {addr}"))?
        .serve(make_svc);
    info!(%addr, "listening");

    server
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("proofd shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("interrupt received"),
        _ = terminate.recv() => info!("SIGTERM received"),
    }
}
