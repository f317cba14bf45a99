//! Campus Portal Server
//!
//! Main server process for the campus event portal.
//!
//! This binary:
//! - Loads configuration from the environment
//! - Wires the in-memory boundary collaborators
//! - Resolves the initial authentication state (bounded by a timeout)
//! - Serves the HTTP and WebSocket API until Ctrl+C
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! ```

use campus_portal::{build_router, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,campus_portal=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Campus Portal server...");

    let config = Config::from_env();
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "Configuration loaded");

    let state = AppState::in_memory(config);

    // Resolve the persisted-session state before serving; bounded by the
    // configured timeout so startup never hangs on a silent identity service.
    state.sessions.resolve_initial().await;
    tracing::info!("Auth state resolved");

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Campus Portal is running; press Ctrl+C to shut down");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down gracefully...");
        })
        .await?;

    Ok(())
}
