//! bridge-server — voucher numbering and cloud submission bridge
//!
//! Long-running service that:
//! - Accepts voucher batches selected by regional finance admins
//! - Assigns gapless sequential voucher numbers (Nepal Sales)
//! - Pushes each voucher to its destination cloud accounting API
//! - Keeps the counter and idempotency ledger consistent with what the
//!   destination actually accepted

use bridge_server::{AppState, Config, api};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bridge_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Starting bridge-server (env: {})", config.environment);

    let state = AppState::new(&config).await?;
    let app = api::create_router(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("bridge-server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}
