use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` controls the filter,
/// defaulting to `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Load `.env` into the process environment when present.
pub fn init_env() {
    dotenvy::dotenv().ok();
}

/// Bind and serve the application until shutdown.
pub async fn serve(service_name: &str, app: Router, listen_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;
    tracing::info!("{service_name} listening on {listen_addr}");
    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;
    Ok(())
}
