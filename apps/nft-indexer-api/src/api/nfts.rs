//! NFT indexing routes
//!
//! Wires the NFT domain to its external services and exposes `/graphql`.

use axum::Router;
use domain_nfts::{
    HttpEmbeddingClient, MongoNftRepository, MoralisProvider, NftRepository, NftService, handlers,
};
use std::sync::Arc;
use tracing::info;

use crate::state::AppState;

/// Create the GraphQL router
pub fn router(state: &AppState) -> eyre::Result<Router> {
    let config = &state.config;

    let provider = MoralisProvider::new(config.moralis.clone())?;
    let embedder = HttpEmbeddingClient::new(config.embedding.clone())?;
    let repository = MongoNftRepository::new(state.db.clone());

    let service = NftService::new(
        Arc::new(provider),
        Arc::new(embedder),
        state.vector_index.clone(),
        Arc::new(repository),
    )
    .with_pipeline_config(config.pipeline);

    info!(
        embed_url = %config.embedding.url,
        index = state.vector_index.name(),
        "NFT service ready"
    );

    // Use the domain's router
    Ok(handlers::router(service))
}

/// Initialize NFT collection indexes in MongoDB
pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    let repository = MongoNftRepository::new(db.clone());
    repository
        .create_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create NFT indexes: {}", e))?;
    info!("NFT collection indexes created");
    Ok(())
}
