use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use movielens_recommender::{
    api::{create_router, AppState},
    config::Config,
    services::{self, MovieRecommender},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movielens_recommender=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(config = ?config, "Configuration loaded");

    // Load and build before binding so no request sees a half-built recommender
    let build_config = config.clone();
    let recommender = tokio::task::spawn_blocking(move || {
        let dataset = services::load_dataset(
            &build_config.data_dir,
            &build_config.snapshot_dir,
            build_config.rebuild_snapshot,
        )?;
        MovieRecommender::from_dataset(dataset)
    })
    .await
    .context("Recommender build task panicked")?
    .context("Failed to build recommender")?;

    let state = AppState::new(Arc::new(recommender));
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "Server running");

    axum::serve(listener, app).await?;
    Ok(())
}
