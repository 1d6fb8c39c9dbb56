mod http;

use async_trait::async_trait;

use crate::error::NftResult;
use crate::models::{EmbedBatch, VectorRecord};

pub use http::{EmbeddingConfig, HttpEmbeddingClient};

/// Turns a batch of image URLs into vector records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, batch: &EmbedBatch) -> NftResult<Vec<VectorRecord>>;
}
