use async_trait::async_trait;

use crate::error::NftResult;
use crate::models::PersistedNftRecord;

/// Repository trait for indexed NFT documents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NftRepository: Send + Sync {
    /// Store one record. Repeated inserts of the same token produce duplicates.
    async fn insert(&self, record: PersistedNftRecord) -> NftResult<()>;

    /// Records indexed for `owner`, newest first
    async fn list_by_owner(&self, owner: &str, limit: i64) -> NftResult<Vec<PersistedNftRecord>>;

    /// Ensure the lookup indexes exist
    async fn create_indexes(&self) -> NftResult<()>;
}
