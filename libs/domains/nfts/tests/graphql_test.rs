//! Handler tests for the NFTs domain
//!
//! These drive the `/graphql` router end to end with in-memory fakes for the
//! provider, the embedding service, the vector index and the repository:
//! - request/response JSON shape
//! - error codes in `extensions.code`
//! - the calls the pipeline makes for a wallet

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_nfts::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt; // For oneshot()

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

enum Holdings {
    Items(Vec<NftItem>),
    Empty,
}

struct FakeProvider {
    holdings: Holdings,
    transfers: Vec<NftTransfer>,
    calls: Mutex<u32>,
}

impl FakeProvider {
    fn holding(items: Vec<NftItem>) -> Self {
        Self {
            holdings: Holdings::Items(items),
            transfers: Vec::new(),
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl NftProvider for FakeProvider {
    async fn wallet_nfts(&self, _address: &str, _chain: &str) -> NftResult<Vec<NftItem>> {
        *self.calls.lock().unwrap() += 1;
        match &self.holdings {
            Holdings::Items(items) => Ok(items.clone()),
            Holdings::Empty => Err(NftError::ProviderEmpty("An error occured".into())),
        }
    }

    async fn wallet_transfers(
        &self,
        _address: &str,
        _chain: &str,
        _limit: u32,
    ) -> NftResult<Vec<NftTransfer>> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.transfers.clone())
    }
}

#[derive(Default)]
struct FakeEmbedder {
    batches: Mutex<Vec<EmbedBatch>>,
    fail_batch: Option<usize>,
}

#[async_trait]
impl EmbeddingClient for FakeEmbedder {
    async fn embed(&self, batch: &EmbedBatch) -> NftResult<Vec<VectorRecord>> {
        self.batches.lock().unwrap().push(batch.clone());
        if self.fail_batch == Some(batch.index) {
            return Err(NftError::Embedding("connection refused".into()));
        }
        Ok(batch
            .entries
            .iter()
            .map(|(id, url)| VectorRecord {
                id: id.clone(),
                values: vec![0.25; 8],
                metadata: Some(json!({ "image_url": url })),
            })
            .collect())
    }
}

#[derive(Default)]
struct FakeIndex {
    upserts: Mutex<Vec<Vec<VectorRecord>>>,
}

#[async_trait]
impl VectorIndex for FakeIndex {
    fn name(&self) -> &str {
        "fake-index"
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> NftResult<u32> {
        let count = records.len() as u32;
        self.upserts.lock().unwrap().push(records);
        Ok(count)
    }
}

#[derive(Default)]
struct FakeRepository {
    records: Mutex<Vec<PersistedNftRecord>>,
}

#[async_trait]
impl NftRepository for FakeRepository {
    async fn insert(&self, record: PersistedNftRecord) -> NftResult<()> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    async fn list_by_owner(&self, owner: &str, limit: i64) -> NftResult<Vec<PersistedNftRecord>> {
        let owner = owner.to_lowercase();
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.owner_address == owner)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn create_indexes(&self) -> NftResult<()> {
        Ok(())
    }
}

struct Harness {
    provider: Arc<FakeProvider>,
    embedder: Arc<FakeEmbedder>,
    index: Arc<FakeIndex>,
    repository: Arc<FakeRepository>,
}

impl Harness {
    fn new(provider: FakeProvider, embedder: FakeEmbedder) -> Self {
        Self {
            provider: Arc::new(provider),
            embedder: Arc::new(embedder),
            index: Arc::new(FakeIndex::default()),
            repository: Arc::new(FakeRepository::default()),
        }
    }

    fn app(&self) -> axum::Router {
        let service = NftService::new(
            self.provider.clone(),
            self.embedder.clone(),
            self.index.clone(),
            self.repository.clone(),
        );
        handlers::router(service)
    }
}

fn wallet(count: usize) -> Vec<NftItem> {
    (0..count)
        .map(|i| {
            NftItem::new(format!("{}", 1000 + i))
                .with_token_address("0xcollection")
                .with_image(format!("ipfs://QmImage{i}"))
        })
        .collect()
}

fn graphql_request(query: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/graphql")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({ "query": query })).unwrap(),
        ))
        .unwrap()
}

fn error_code(body: &Value) -> &str {
    body["errors"][0]["extensions"]["code"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_get_nft_data_indexes_whole_wallet() {
    let harness = Harness::new(FakeProvider::holding(wallet(25)), FakeEmbedder::default());

    let response = harness
        .app()
        .oneshot(graphql_request(
            r#"mutation { getNFTData(input: { address: "0xWallet" }) { success message } }"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["data"]["getNFTData"]["success"], true);

    let mut sizes: Vec<usize> = harness
        .embedder
        .batches
        .lock()
        .unwrap()
        .iter()
        .map(EmbedBatch::len)
        .collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![5, 10, 10]);

    // every upsert carries exactly the embeddings of one batch
    let batches = harness.embedder.batches.lock().unwrap();
    let upserts = harness.index.upserts.lock().unwrap();
    assert_eq!(upserts.len(), 3);
    for upsert in upserts.iter() {
        let ids: Vec<&str> = upsert.iter().map(|r| r.id.as_str()).collect();
        assert!(batches.iter().any(|b| b.token_ids().collect::<Vec<_>>() == ids));
    }
    let image_url = &upserts[0][0].metadata.as_ref().unwrap()["image_url"];
    assert!(image_url.as_str().unwrap().starts_with("https://ipfs.io/ipfs/"));

    let records = harness.repository.records.lock().unwrap();
    assert_eq!(records.len(), 25);
    assert!(records.iter().all(|r| r.owner_address == "0xwallet"));
    assert!(records.iter().all(|r| r.image_url.starts_with("ipfs://")));
}

#[tokio::test]
async fn test_get_nft_data_without_address_is_incomplete_input() {
    let harness = Harness::new(FakeProvider::holding(wallet(3)), FakeEmbedder::default());

    let response = harness
        .app()
        .oneshot(graphql_request(
            r#"mutation { getNFTData(input: { address: "" }) { success } }"#,
        ))
        .await
        .unwrap();

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(error_code(&body), "INCOMPLETE_INPUT");
    assert_eq!(*harness.provider.calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_get_nft_data_provider_empty_is_unexpected_error() {
    let provider = FakeProvider {
        holdings: Holdings::Empty,
        transfers: Vec::new(),
        calls: Mutex::new(0),
    };
    let harness = Harness::new(provider, FakeEmbedder::default());

    let response = harness
        .app()
        .oneshot(graphql_request(
            r#"mutation { getNFTData(input: { address: "0xabc" }) { success } }"#,
        ))
        .await
        .unwrap();

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(error_code(&body), "UNEXPECTED_ERROR");
    assert_eq!(body["errors"][0]["message"], "An error occured");
    assert!(harness.embedder.batches.lock().unwrap().is_empty());
    assert!(harness.repository.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_embedding_failure_fails_whole_request() {
    let embedder = FakeEmbedder {
        fail_batch: Some(1),
        ..Default::default()
    };
    let harness = Harness::new(FakeProvider::holding(wallet(25)), embedder);

    let response = harness
        .app()
        .oneshot(graphql_request(
            r#"mutation { getNFTData(input: { address: "0xabc" }) { success } }"#,
        ))
        .await
        .unwrap();

    let body: Value = json_body(response.into_body()).await;
    assert!(body["data"].is_null());
    assert_eq!(error_code(&body), "INTERNAL_SERVER_ERROR");
    let message = body["errors"][0]["message"].as_str().unwrap();
    assert!(message.contains("batch 1"), "{message}");
}

#[tokio::test]
async fn test_get_user_nft_data_indexes_received_tokens() {
    let provider = FakeProvider {
        holdings: Holdings::Items(wallet(4)),
        transfers: vec![
            NftTransfer {
                token_address: "0xCollection".into(),
                token_id: "1002".into(),
                to_address: Some("0xabc".into()),
                ..Default::default()
            },
            NftTransfer {
                token_address: "0xcollection".into(),
                token_id: "1003".into(),
                from_address: Some("0xabc".into()),
                to_address: Some("0xelsewhere".into()),
                ..Default::default()
            },
        ],
        calls: Mutex::new(0),
    };
    let harness = Harness::new(provider, FakeEmbedder::default());

    let response = harness
        .app()
        .oneshot(graphql_request(
            r#"mutation { getUserNFTData(input: { address: "0xABC" }) { success } }"#,
        ))
        .await
        .unwrap();

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["data"]["getUserNFTData"]["success"], true);

    let records = harness.repository.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].token_id, "1002");
}

#[tokio::test]
async fn test_get_nfts_lists_indexed_records() {
    let harness = Harness::new(FakeProvider::holding(wallet(3)), FakeEmbedder::default());
    let app = harness.app();

    app.clone()
        .oneshot(graphql_request(
            r#"mutation { getNFTData(input: { address: "0xabc", chain: "0x1" }) { success } }"#,
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(graphql_request(
            r#"{ getNFTs(address: "0xABC", limit: 2) { token_id token_address metadata_attributes } }"#,
        ))
        .await
        .unwrap();

    let body: Value = json_body(response.into_body()).await;
    let records = body["data"]["getNFTs"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["token_address"], "0xcollection");
}

#[tokio::test]
async fn test_graphiql_page_is_served() {
    let harness = Harness::new(FakeProvider::holding(Vec::new()), FakeEmbedder::default());

    let response = harness
        .app()
        .oneshot(
            Request::builder()
                .uri("/graphql")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&bytes).contains("graphiql"));
}
