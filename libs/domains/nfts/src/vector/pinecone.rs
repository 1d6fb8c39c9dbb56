use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_required};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::VectorIndex;
use crate::error::{NftError, NftResult};
use crate::models::VectorRecord;

pub const DEFAULT_CONTROL_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2024-07";

/// Dimension of the CLIP image embeddings
pub const EMBEDDING_DIMENSION: u32 = 512;

/// Pinecone serverless index configuration
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub index_name: String,
    pub cloud: String,
    pub region: String,
    pub namespace: Option<String>,
    pub control_url: String,
    pub dimension: u32,
    pub metric: String,
    /// Describe attempts while waiting for a fresh index to become ready
    pub ready_attempts: u32,
    pub ready_interval: Duration,
}

impl PineconeConfig {
    pub fn new(api_key: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            index_name: index_name.into(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            namespace: None,
            control_url: DEFAULT_CONTROL_URL.to_string(),
            dimension: EMBEDDING_DIMENSION,
            metric: "cosine".to_string(),
            ready_attempts: 30,
            ready_interval: Duration::from_secs(2),
        }
    }

    pub fn with_control_url(mut self, control_url: impl Into<String>) -> Self {
        self.control_url = control_url.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl FromEnv for PineconeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::new(
            env_required("PINECONE_API_KEY")?,
            env_required("PINECONE_INDEX_NAME")?,
        );

        Ok(Self {
            cloud: env_or_default("PINECONE_CLOUD", &defaults.cloud),
            region: env_or_default("PINECONE_REGION", &defaults.region),
            namespace: env_optional("PINECONE_NAMESPACE"),
            control_url: env_or_default("PINECONE_CONTROL_URL", DEFAULT_CONTROL_URL),
            ..defaults
        })
    }
}

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Debug, Deserialize)]
struct IndexModel {
    name: String,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    status: Option<IndexStatus>,
}

#[derive(Debug, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: u32,
    metric: &'a str,
    spec: IndexSpec<'a>,
}

#[derive(Debug, Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: u32,
}

/// Handle to one Pinecone index, bound to its data-plane host
pub struct PineconeIndex {
    client: Client,
    config: PineconeConfig,
    data_url: String,
}

impl std::fmt::Debug for PineconeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeIndex")
            .field("index", &self.config.index_name)
            .field("data_url", &self.data_url)
            .finish()
    }
}

impl PineconeIndex {
    /// Resolve the index, creating it first when the project does not have it.
    #[instrument(skip(config), fields(index = %config.index_name))]
    pub async fn connect(config: PineconeConfig) -> NftResult<Self> {
        let client = Client::new();
        let control = ControlPlane {
            client: &client,
            config: &config,
        };

        let listed = control.list_indexes().await?;
        if listed.indexes.iter().any(|index| index.name == config.index_name) {
            debug!("Pinecone index already exists");
        } else {
            info!(
                dimension = config.dimension,
                metric = %config.metric,
                "Creating Pinecone index"
            );
            control.create_index().await?;
        }

        let host = control.wait_until_ready().await?;
        let data_url = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{}", host)
        };

        info!(host = %data_url, "Connected to Pinecone index");
        Ok(Self {
            client,
            config,
            data_url,
        })
    }

    pub async fn from_env() -> NftResult<Self> {
        Self::connect(PineconeConfig::from_env()?).await
    }
}

struct ControlPlane<'a> {
    client: &'a Client,
    config: &'a PineconeConfig,
}

impl ControlPlane<'_> {
    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Api-Key", &self.config.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.control_url.trim_end_matches('/'), path)
    }

    async fn list_indexes(&self) -> NftResult<IndexList> {
        let response = self
            .request(self.client.get(self.url("/indexes")))
            .send()
            .await
            .map_err(vector_error)?;
        parse(response).await
    }

    async fn create_index(&self) -> NftResult<()> {
        let body = CreateIndexRequest {
            name: &self.config.index_name,
            dimension: self.config.dimension,
            metric: &self.config.metric,
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: &self.config.cloud,
                    region: &self.config.region,
                },
            },
        };

        let response = self
            .request(self.client.post(self.url("/indexes")))
            .json(&body)
            .send()
            .await
            .map_err(vector_error)?;

        // another process created it between our list and create
        if response.status() == StatusCode::CONFLICT {
            debug!("Pinecone index created concurrently");
            return Ok(());
        }
        check(response).await.map(|_| ())
    }

    async fn describe_index(&self) -> NftResult<IndexModel> {
        let path = format!("/indexes/{}", urlencoding::encode(&self.config.index_name));
        let response = self
            .request(self.client.get(self.url(&path)))
            .send()
            .await
            .map_err(vector_error)?;
        parse(response).await
    }

    /// Describe until the index reports ready and exposes a host.
    async fn wait_until_ready(&self) -> NftResult<String> {
        let attempts = self.config.ready_attempts.max(1);
        for attempt in 1..=attempts {
            let model = self.describe_index().await?;
            let ready = model.status.as_ref().is_some_and(|s| s.ready);
            match model.host {
                Some(host) if ready && !host.is_empty() => return Ok(host),
                _ => {
                    debug!(attempt, attempts, "Pinecone index not ready yet");
                    if attempt < attempts {
                        tokio::time::sleep(self.config.ready_interval).await;
                    }
                }
            }
        }

        Err(NftError::VectorIndex(format!(
            "Index {} did not become ready",
            self.config.index_name
        )))
    }
}

fn vector_error(err: reqwest::Error) -> NftError {
    NftError::VectorIndex(err.to_string())
}

async fn check(response: Response) -> NftResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    Err(NftError::VectorIndex(format!(
        "Pinecone API error ({}): {}",
        status, error_text
    )))
}

async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> NftResult<T> {
    check(response)
        .await?
        .json()
        .await
        .map_err(|e| NftError::VectorIndex(format!("Invalid Pinecone response: {}", e)))
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        &self.config.index_name
    }

    #[instrument(skip(self, records), fields(index = %self.config.index_name, count = records.len()))]
    async fn upsert(&self, records: Vec<VectorRecord>) -> NftResult<u32> {
        if records.is_empty() {
            return Ok(0);
        }

        let body = UpsertRequest {
            vectors: &records,
            namespace: self.config.namespace.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/vectors/upsert", self.data_url))
            .header("Api-Key", &self.config.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(vector_error)?;

        let result: UpsertResponse = parse(response).await?;
        debug!(upserted = result.upserted_count, "Vectors upserted");
        Ok(result.upserted_count)
    }
}
