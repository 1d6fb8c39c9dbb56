//! GraphQL schema for the wallet indexing API

use async_graphql::{Context, EmptySubscription, ErrorExtensions, Json, Object, Schema, SimpleObject};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

use crate::error::NftError;
use crate::models::{IndexRequest, PersistedNftRecord, RequestResponse};
use crate::service::NftService;

pub type NftSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the executable schema with `service` in its context data.
pub fn build_schema(service: Arc<NftService>) -> NftSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(service)
        .finish()
}

/// Stored NFT as exposed to clients; field names follow the documents
#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "NftRecord", rename_fields = "snake_case")]
pub struct NftRecord {
    pub token_id: String,
    pub token_address: String,
    pub contract_type: String,
    pub name: String,
    pub symbol: String,
    pub token_hash: String,
    pub token_uri: String,
    pub image_url: String,
    pub metadata_description: String,
    pub metadata_attributes: Json<Value>,
    pub owner_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PersistedNftRecord> for NftRecord {
    fn from(record: PersistedNftRecord) -> Self {
        Self {
            token_id: record.token_id,
            token_address: record.token_address,
            contract_type: record.contract_type,
            name: record.name,
            symbol: record.symbol,
            token_hash: record.token_hash,
            token_uri: record.token_uri,
            image_url: record.image_url,
            metadata_description: record.metadata_description,
            metadata_attributes: Json(record.metadata_attributes),
            owner_address: record.owner_address,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Log the failure and turn it into a coded GraphQL error.
fn reject(operation: &'static str, err: NftError) -> async_graphql::Error {
    tracing::error!(operation, code = %err.code(), error = %err, "GraphQL operation failed");
    err.extend()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// NFTs previously indexed for a wallet, newest first
    #[graphql(name = "getNFTs")]
    async fn get_nfts(
        &self,
        ctx: &Context<'_>,
        address: String,
        #[graphql(default = 50)] limit: i32,
    ) -> async_graphql::Result<Vec<NftRecord>> {
        let service = ctx.data::<Arc<NftService>>()?;
        let records = service
            .list_indexed(&address, i64::from(limit))
            .await
            .map_err(|e| reject("getNFTs", e))?;
        Ok(records.into_iter().map(NftRecord::from).collect())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Embed and store every NFT the wallet holds
    #[graphql(name = "getNFTData")]
    async fn get_nft_data(
        &self,
        ctx: &Context<'_>,
        input: IndexRequest,
    ) -> async_graphql::Result<RequestResponse> {
        let service = ctx.data::<Arc<NftService>>()?;
        service
            .index_wallet(input)
            .await
            .map_err(|e| reject("getNFTData", e))
    }

    /// Embed and store the wallet's NFTs that arrived through recent transfers
    #[graphql(name = "getUserNFTData")]
    async fn get_user_nft_data(
        &self,
        ctx: &Context<'_>,
        input: IndexRequest,
    ) -> async_graphql::Result<RequestResponse> {
        let service = ctx.data::<Arc<NftService>>()?;
        service
            .index_received(input)
            .await
            .map_err(|e| reject("getUserNFTData", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbeddingClient;
    use crate::provider::MockNftProvider;
    use crate::repository::MockNftRepository;
    use crate::vector::MockVectorIndex;

    fn schema(provider: MockNftProvider, repository: MockNftRepository) -> NftSchema {
        let service = NftService::new(
            Arc::new(provider),
            Arc::new(MockEmbeddingClient::new()),
            Arc::new(MockVectorIndex::new()),
            Arc::new(repository),
        );
        build_schema(Arc::new(service))
    }

    #[test]
    fn test_sdl_exposes_operations() {
        let sdl = schema(MockNftProvider::new(), MockNftRepository::new()).sdl();

        assert!(sdl.contains("getNFTData(input: nftVariables!): requestResponse!"));
        assert!(sdl.contains("getUserNFTData(input: nftVariables!): requestResponse!"));
        assert!(sdl.contains("getNFTs(address: String!, limit: Int! = 50)"));
        assert!(sdl.contains("input nftVariables"));
        assert!(sdl.contains("token_id: String!"));
    }

    #[tokio::test]
    async fn test_missing_address_reports_incomplete_input() {
        let mut provider = MockNftProvider::new();
        provider.expect_wallet_nfts().never();

        let response = schema(provider, MockNftRepository::new())
            .execute("mutation { getNFTData(input: { chain: \"0x1\" }) { success } }")
            .await;

        assert_eq!(response.errors.len(), 1);
        let error = &response.errors[0];
        assert_eq!(error.message, "All fields are required");
        let code = error.extensions.as_ref().and_then(|ext| ext.get("code"));
        assert_eq!(code, Some(&async_graphql::Value::from("INCOMPLETE_INPUT")));
    }

    #[tokio::test]
    async fn test_get_nfts_maps_records() {
        let mut repository = MockNftRepository::new();
        repository.expect_list_by_owner().returning(|owner, _| {
            let item = crate::models::NftItem::new("3").with_image("ipfs://img");
            Ok(vec![PersistedNftRecord::from_item(&item, owner)])
        });

        let response = schema(MockNftProvider::new(), repository)
            .execute(r#"{ getNFTs(address: "0xAbc") { token_id image_url owner_address } }"#)
            .await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert_eq!(data["getNFTs"][0]["token_id"], "3");
        assert_eq!(data["getNFTs"][0]["owner_address"], "0xabc");
    }
}
