use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_required};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::NftProvider;
use crate::error::{NftError, NftResult};
use crate::models::{NftItem, NftTransfer};

pub const DEFAULT_MORALIS_BASE_URL: &str = "https://deep-index.moralis.io/api/v2.2";

/// Moralis Web3 Data API configuration
#[derive(Debug, Clone)]
pub struct MoralisConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Upper bound on cursor pages followed per wallet
    pub max_pages: u32,
}

impl MoralisConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_MORALIS_BASE_URL.to_string(),
            timeout_secs: 30,
            max_pages: 10,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }
}

impl FromEnv for MoralisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::new(env_required("MORALIS_API_KEY")?);

        Ok(Self {
            base_url: env_or_default("MORALIS_BASE_URL", DEFAULT_MORALIS_BASE_URL),
            timeout_secs: env_parse("MORALIS_TIMEOUT_SECS", defaults.timeout_secs)?,
            max_pages: env_parse("MORALIS_MAX_PAGES", defaults.max_pages)?,
            ..defaults
        })
    }
}

/// One page of a Moralis list endpoint
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default)]
    cursor: Option<String>,
    result: Option<Vec<T>>,
}

/// [`NftProvider`] backed by the Moralis REST API
pub struct MoralisProvider {
    client: Client,
    config: MoralisConfig,
}

impl MoralisProvider {
    pub fn new(config: MoralisConfig) -> NftResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NftError::Config(format!("Failed to build Moralis client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> NftResult<Self> {
        Self::new(MoralisConfig::from_env()?)
    }

    fn endpoint(&self, address: &str, path: &str) -> String {
        format!(
            "{}/{}{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(address),
            path
        )
    }

    async fn fetch_page<T: DeserializeOwned>(&self, request: RequestBuilder) -> NftResult<Page<T>> {
        let response = request
            .header("X-API-Key", &self.config.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| NftError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(NftError::Provider(format!(
                "Moralis API error ({}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| NftError::Provider(format!("Invalid Moralis response: {}", e)))
    }

    /// Walk the wallet's NFT pages up to `max_pages`.
    ///
    /// Returns the items and the cursor still pending once the page budget is
    /// spent, `None` when the provider ran out of pages first.
    async fn wallet_pages(
        &self,
        address: &str,
        chain: &str,
    ) -> NftResult<(Vec<NftItem>, Option<String>)> {
        let url = self.endpoint(address, "/nft");
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        for page_number in 1..=self.config.max_pages.max(1) {
            let mut request = self.client.get(&url).query(&[
                ("chain", chain),
                ("format", "decimal"),
                ("normalizeMetadata", "true"),
                ("media_items", "true"),
            ]);
            if let Some(ref cursor) = cursor {
                request = request.query(&[("cursor", cursor.as_str())]);
            }

            let page: Page<NftItem> = self.fetch_page(request).await?;
            let result = page.result.ok_or_else(NftError::provider_empty)?;
            debug!(page = page_number, count = result.len(), "Fetched wallet NFT page");
            items.extend(result);

            cursor = page.cursor.filter(|c| !c.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        Ok((items, cursor))
    }
}

#[async_trait]
impl NftProvider for MoralisProvider {
    #[instrument(skip(self))]
    async fn wallet_nfts(&self, address: &str, chain: &str) -> NftResult<Vec<NftItem>> {
        let (items, pending) = self.wallet_pages(address, chain).await?;
        if pending.is_some() {
            warn!(
                pages = self.config.max_pages,
                items = items.len(),
                "Moralis cursor not exhausted; wallet truncated"
            );
        }
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn wallet_transfers(
        &self,
        address: &str,
        chain: &str,
        limit: u32,
    ) -> NftResult<Vec<NftTransfer>> {
        let limit = limit.to_string();
        let request = self
            .client
            .get(self.endpoint(address, "/nft/transfers"))
            .query(&[
                ("chain", chain),
                ("format", "decimal"),
                ("order", "DESC"),
                ("limit", limit.as_str()),
            ]);

        let page: Page<NftTransfer> = self.fetch_page(request).await?;
        page.result.ok_or_else(NftError::provider_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Query,
        http::{HeaderMap, StatusCode},
        routing::get,
    };
    use serde_json::{Value, json};
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{}", addr)
    }

    fn provider(base_url: String) -> MoralisProvider {
        MoralisProvider::new(MoralisConfig::new("test-key").with_base_url(base_url)).unwrap()
    }

    async fn paged_nfts(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> Result<Json<Value>, StatusCode> {
        if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
            return Err(StatusCode::UNAUTHORIZED);
        }
        assert_eq!(params.get("normalizeMetadata").map(String::as_str), Some("true"));

        let body = match params.get("cursor").map(String::as_str) {
            None => json!({ "cursor": "page-2", "result": [{ "token_id": "1" }, { "token_id": "2" }] }),
            Some("page-2") => json!({ "cursor": null, "result": [{ "token_id": "3" }] }),
            Some(_) => return Err(StatusCode::BAD_REQUEST),
        };
        Ok(Json(body))
    }

    #[tokio::test]
    async fn test_wallet_nfts_follows_cursor() {
        let base = serve(Router::new().route("/{address}/nft", get(paged_nfts))).await;

        let items = provider(base.clone()).wallet_nfts("0xabc", "0x1").await.unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.token_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        let (_, pending) = provider(base).wallet_pages("0xabc", "0x1").await.unwrap();
        assert!(pending.is_none());
    }

    #[tokio::test]
    async fn test_wallet_nfts_respects_max_pages() {
        let base = serve(Router::new().route("/{address}/nft", get(paged_nfts))).await;

        let provider = MoralisProvider::new(
            MoralisConfig::new("test-key").with_base_url(base).with_max_pages(1),
        )
        .unwrap();
        assert_eq!(provider.wallet_nfts("0xabc", "0x1").await.unwrap().len(), 2);

        // the unread page is reported so the truncation can be logged
        let (items, pending) = provider.wallet_pages("0xabc", "0x1").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(pending.as_deref(), Some("page-2"));
    }

    #[tokio::test]
    async fn test_missing_result_is_provider_empty() {
        let router = Router::new().route(
            "/{address}/nft",
            get(|| async { Json(json!({ "status": "SYNCING" })) }),
        );
        let base = serve(router).await;

        let err = provider(base).wallet_nfts("0xabc", "0x1").await.unwrap_err();
        assert!(matches!(err, NftError::ProviderEmpty(_)));
    }

    #[tokio::test]
    async fn test_non_success_status_is_provider_error() {
        let router = Router::new().route(
            "/{address}/nft/transfers",
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = serve(router).await;

        let err = provider(base)
            .wallet_transfers("0xabc", "0x1", 50)
            .await
            .unwrap_err();
        match err {
            NftError::Provider(msg) => assert!(msg.contains("429")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wallet_transfers_sends_limit_and_order() {
        let router = Router::new().route(
            "/{address}/nft/transfers",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("order").map(String::as_str), Some("DESC"));
                assert_eq!(params.get("limit").map(String::as_str), Some("50"));
                Json(json!({ "result": [{ "token_address": "0xc", "token_id": "9", "to_address": "0xabc" }] }))
            }),
        );
        let base = serve(router).await;

        let transfers = provider(base)
            .wallet_transfers("0xabc", "0x1", 50)
            .await
            .unwrap();
        assert_eq!(transfers.len(), 1);
        assert!(transfers[0].is_received_by("0xABC"));
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("MORALIS_API_KEY", Some("k")),
                ("MORALIS_BASE_URL", None),
                ("MORALIS_MAX_PAGES", Some("3")),
            ],
            || {
                let config = MoralisConfig::from_env().unwrap();
                assert_eq!(config.base_url, DEFAULT_MORALIS_BASE_URL);
                assert_eq!(config.max_pages, 3);
                assert_eq!(config.timeout_secs, 30);
            },
        );
    }

    #[test]
    fn test_config_requires_api_key() {
        temp_env::with_var_unset("MORALIS_API_KEY", || {
            assert!(MoralisConfig::from_env().is_err());
        });
    }
}
