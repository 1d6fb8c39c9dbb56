//! MongoDB implementation of NftRepository

use async_trait::async_trait;
use database::mongodb::{Collection, Database};
use futures::TryStreamExt;
use mongodb::{
    IndexModel,
    bson::doc,
    options::{FindOptions, IndexOptions},
};
use tracing::instrument;

use crate::error::NftResult;
use crate::models::PersistedNftRecord;
use crate::repository::NftRepository;

pub const NFT_COLLECTION: &str = "nftdatas";

/// MongoDB implementation of the NftRepository
pub struct MongoNftRepository {
    collection: Collection<PersistedNftRecord>,
}

impl MongoNftRepository {
    /// Create a repository on the `nftdatas` collection of `db`
    ///
    /// # Example
    /// ```ignore
    /// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let repo = MongoNftRepository::new(client.database("nft"));
    /// ```
    pub fn new(db: Database) -> Self {
        Self::with_collection(db, NFT_COLLECTION)
    }

    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        let collection = db.collection::<PersistedNftRecord>(collection_name);
        Self { collection }
    }

    pub fn collection(&self) -> &Collection<PersistedNftRecord> {
        &self.collection
    }
}

#[async_trait]
impl NftRepository for MongoNftRepository {
    #[instrument(skip(self, record), fields(token_id = %record.token_id))]
    async fn insert(&self, record: PersistedNftRecord) -> NftResult<()> {
        self.collection.insert_one(&record).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_by_owner(&self, owner: &str, limit: i64) -> NftResult<Vec<PersistedNftRecord>> {
        let options = FindOptions::builder()
            .limit(limit)
            .sort(doc! { "createdAt": -1 })
            .build();

        let cursor = self
            .collection
            .find(doc! { "owner_address": owner.to_lowercase() })
            .with_options(options)
            .await?;

        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn create_indexes(&self) -> NftResult<()> {
        let owner_token = IndexModel::builder()
            .keys(doc! { "owner_address": 1, "token_address": 1, "token_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("owner_token_idx".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(owner_token).await?;
        tracing::info!(collection = NFT_COLLECTION, "NFT indexes ensured");
        Ok(())
    }
}
