//! Vector index seam

mod pinecone;

use async_trait::async_trait;

use crate::error::NftResult;
use crate::models::VectorRecord;

pub use pinecone::{PineconeConfig, PineconeIndex};

/// Similarity index receiving the embedding of every indexed NFT.
///
/// A handle is created once at startup and shared by reference.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Index name, for logs.
    fn name(&self) -> &str;

    /// Insert or overwrite `records`, returning how many the index accepted.
    async fn upsert(&self, records: Vec<VectorRecord>) -> NftResult<u32>;
}
