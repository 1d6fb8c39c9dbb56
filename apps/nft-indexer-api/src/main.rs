use axum_helpers::server::{close_mongodb, create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_nfts::{PineconeIndex, VectorIndex};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.environment);

    info!("Connecting to MongoDB at {}", config.mongodb.redacted_url());

    // Connect to MongoDB with retry
    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;

    let db = mongo_client.database(config.mongodb.database());

    info!(
        "Successfully connected to MongoDB database: {}",
        config.mongodb.database()
    );

    // Initialize indexes
    api::nfts::init_indexes(&db).await?;

    // Resolve (or create) the vector index once; every request shares it
    let vector_index: Arc<dyn VectorIndex> =
        Arc::new(PineconeIndex::connect(config.pinecone.clone()).await?);

    let state = AppState {
        config,
        mongo_client,
        db,
        vector_index,
    };

    let routes = api::routes(&state)?.merge(health_router(state.config.app));
    let app = create_router(routes, &state.config.environment)?;

    info!("Starting NFT indexer API with production-ready shutdown (30s timeout)");

    let mongo_client = state.mongo_client.clone();
    create_production_app(
        app,
        &state.config.server,
        Duration::from_secs(30),
        async move {
            info!("Shutting down: closing MongoDB connections");
            close_mongodb(mongo_client, "main").await;
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("NFT indexer API shutdown complete");
    Ok(())
}
