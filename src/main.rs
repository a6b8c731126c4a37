//! Session Cache host server
//!
//! Serves UI sessions over HTTP against the in-memory analytical backend.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use session_cache::api::{create_router, AppState};
use session_cache::client::{Credentials, InMemoryClient, Row};
use session_cache::config::Config;
use session_cache::tasks::spawn_session_reaper;

/// Main entry point for the session cache host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the backend client and application state
/// 4. Start the idle session reaper
/// 5. Serve the router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting session cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, default_ttl={}s, idle_timeout={}s, reaper_interval={}s, backend={:?}",
        config.server_port,
        config.default_ttl,
        config.session_idle_timeout,
        config.reaper_interval,
        config.backend
    );

    let client = demo_client(&config);
    let state = AppState::from_config(&config, Arc::new(client));

    let reaper_handle = spawn_session_reaper(
        state.sessions.clone(),
        Arc::clone(&state.clock),
        config.session_idle_timeout,
        config.reaper_interval,
    );
    info!("Session reaper started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(reaper_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Backend accepting the configured demo credentials, with one sample table.
fn demo_client(config: &Config) -> InMemoryClient {
    let rows: Vec<Row> = [("north", 120), ("south", 80), ("west", 45)]
        .into_iter()
        .filter_map(|(region, total)| {
            json!({ "REGION": region, "TOTAL": total })
                .as_object()
                .cloned()
        })
        .collect();

    InMemoryClient::new()
        .with_credentials(Credentials {
            account: config.demo_account.clone(),
            user: config.demo_user.clone(),
            password: config.demo_password.clone(),
        })
        .with_table(
            "SELECT region, total FROM sales",
            vec!["REGION".to_string(), "TOTAL".to_string()],
            rows,
        )
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts the reaper.
async fn shutdown_signal(reaper_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    reaper_handle.abort();
    warn!("Session reaper aborted");
}
