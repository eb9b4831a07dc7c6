//! Tranquil Server - REST API for accounts, device trust and biometric login
//!
//! Configuration comes from the environment (see [`Config::from_env`]).
//! Without `DATABASE_URL` the server runs on in-memory storage.

use std::net::SocketAddr;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use tranquil_server::{create_router_with_config, db, AppState, Config, JwtKeys};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tranquil_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();

    let jwt_secret = match &config.jwt_secret {
        Some(secret) => secret.clone(),
        None => {
            tracing::warn!("JWT_SECRET not set, using a random key - sessions end on restart!");
            tranquil_core::generate_secret(32)?
        }
    };

    let store = db::connect(&config).await?;
    tracing::info!(
        backend = store.backend(),
        persistent = store.is_persistent(),
        "Storage ready"
    );

    let state = AppState::new(
        store,
        JwtKeys::new(&jwt_secret, config.jwt_expiry_hours),
        config.backup_code_count,
    );
    let app = create_router_with_config(state, &config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Tranquil server listening on {}", addr);
    tracing::info!("API docs available at http://{}/docs", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::warn!("Received SIGTERM, shutting down"),
    }
}
