use anyhow::Context;
use tracing_subscriber::EnvFilter;

use foodlens_api::{
    api::{create_router, AppState},
    config::Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("foodlens_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Model, labels, origins and recommender bundle are loaded once and shared read-only
    let state = AppState::load(&config).context("Failed to load model artifacts")?;

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Server running");

    axum::serve(listener, app).await?;
    Ok(())
}
