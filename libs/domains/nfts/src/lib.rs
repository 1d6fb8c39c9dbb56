//! NFTs Domain
//!
//! Indexes the NFTs held by a wallet: images are resolved, embedded in
//! batches, upserted into a vector index and stored as MongoDB documents.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ Handlers/GraphQL │  ← /graphql endpoint
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │     Service      │  ← Validation, provider calls
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │  BatchPipeline   │  ← embed + upsert batches ∥ persist items
//! └──┬─────┬──────┬──┘
//!    │     │      │
//! Embedding Vector Repository
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_nfts::{
//!     EmbeddingConfig, HttpEmbeddingClient, MongoNftRepository, MoralisProvider, NftService,
//!     PineconeIndex, handlers,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = mongodb::Client::with_uri_str("mongodb://localhost:27017").await?;
//!
//! let service = NftService::new(
//!     Arc::new(MoralisProvider::from_env()?),
//!     Arc::new(HttpEmbeddingClient::new(EmbeddingConfig::default())?),
//!     Arc::new(PineconeIndex::from_env().await?),
//!     Arc::new(MongoNftRepository::new(client.database("nft"))),
//! );
//!
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod batching;
pub mod embedding;
pub mod error;
pub mod graphql;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod normalizer;
pub mod pipeline;
pub mod provider;
pub mod repository;
pub mod service;
pub mod vector;

// Re-export commonly used types
pub use self::mongodb::MongoNftRepository;
pub use embedding::{EmbeddingClient, EmbeddingConfig, HttpEmbeddingClient};
pub use error::{ErrorCode, NftError, NftResult, PipelineError};
pub use graphql::{NftSchema, build_schema};
pub use models::{
    EmbedBatch, IndexRequest, NftItem, NftTransfer, PersistedNftRecord, PipelineReport,
    RequestResponse, ResolvedImageMap, VectorRecord,
};
pub use pipeline::{BatchPipeline, PipelineConfig};
pub use provider::{MoralisConfig, MoralisProvider, NftProvider};
pub use repository::NftRepository;
pub use service::NftService;
pub use vector::{PineconeConfig, PineconeIndex, VectorIndex};
