//! NFT Service - request validation and orchestration

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::embedding::EmbeddingClient;
use crate::error::{NftError, NftResult};
use crate::models::{IndexRequest, NftItem, PersistedNftRecord, RequestResponse};
use crate::pipeline::{BatchPipeline, PipelineConfig};
use crate::provider::NftProvider;
use crate::repository::NftRepository;
use crate::vector::VectorIndex;

/// Transfers inspected when indexing received NFTs
pub const RECEIVED_TRANSFER_LIMIT: u32 = 50;

/// Most records `list_indexed` returns
pub const MAX_LIST_LIMIT: i64 = 500;

pub const INDEXED_MESSAGE: &str = "Data upserted to pinecone mongo successfully";
pub const EMPTY_WALLET_MESSAGE: &str = "No NFTs found for this wallet";

/// NFT service providing the wallet indexing operations
pub struct NftService {
    provider: Arc<dyn NftProvider>,
    repository: Arc<dyn NftRepository>,
    pipeline: BatchPipeline,
}

impl NftService {
    pub fn new(
        provider: Arc<dyn NftProvider>,
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        repository: Arc<dyn NftRepository>,
    ) -> Self {
        let pipeline = BatchPipeline::new(embedder, index, repository.clone());
        Self {
            provider,
            repository,
            pipeline,
        }
    }

    pub fn with_pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline = self.pipeline.with_config(config);
        self
    }

    /// Index every NFT the wallet currently holds
    #[instrument(skip(self, input), fields(address = ?input.address))]
    pub async fn index_wallet(&self, input: IndexRequest) -> NftResult<RequestResponse> {
        let address = require_address(&input)?;
        let chain = input.chain_or_default();

        let items = self.provider.wallet_nfts(address, chain).await?;
        self.index_items(address, &items).await
    }

    /// Index the wallet's holdings that arrived through its latest transfers
    #[instrument(skip(self, input), fields(address = ?input.address))]
    pub async fn index_received(&self, input: IndexRequest) -> NftResult<RequestResponse> {
        let address = require_address(&input)?;
        let chain = input.chain_or_default();

        let transfers = self
            .provider
            .wallet_transfers(address, chain, RECEIVED_TRANSFER_LIMIT)
            .await?;

        let received: HashSet<(String, String)> = transfers
            .into_iter()
            .filter(|t| t.is_received_by(address))
            .map(|t| (t.token_address.to_lowercase(), t.token_id))
            .collect();

        if received.is_empty() {
            info!("No incoming transfers");
            return Ok(RequestResponse::ok(EMPTY_WALLET_MESSAGE));
        }

        let held = self.provider.wallet_nfts(address, chain).await?;
        let items: Vec<NftItem> = held
            .into_iter()
            .filter(|item| {
                let token_address = item.token_address.as_deref().unwrap_or_default();
                received.contains(&(token_address.to_lowercase(), item.token_id.clone()))
            })
            .collect();

        self.index_items(address, &items).await
    }

    /// Records previously indexed for `address`
    #[instrument(skip(self))]
    pub async fn list_indexed(&self, address: &str, limit: i64) -> NftResult<Vec<PersistedNftRecord>> {
        let address = address.trim();
        if address.is_empty() {
            return Err(NftError::incomplete_input());
        }
        self.repository
            .list_by_owner(address, limit.clamp(1, MAX_LIST_LIMIT))
            .await
    }

    async fn index_items(&self, address: &str, items: &[NftItem]) -> NftResult<RequestResponse> {
        if items.is_empty() {
            info!("Nothing to index");
            return Ok(RequestResponse::ok(EMPTY_WALLET_MESSAGE));
        }

        let report = self.pipeline.run(address, items).await?;
        info!(
            items = report.items,
            batches = report.batches,
            "Wallet indexed"
        );
        Ok(RequestResponse::ok(INDEXED_MESSAGE))
    }
}

/// Non-blank wallet address from the request
fn require_address(input: &IndexRequest) -> NftResult<&str> {
    input
        .address
        .as_deref()
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .ok_or_else(NftError::incomplete_input)
}
