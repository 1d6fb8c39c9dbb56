use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use super::EmbeddingClient;
use crate::error::{NftError, NftResult};
use crate::models::{EmbedBatch, VectorRecord};

pub const DEFAULT_EMBED_SERVICE_URL: &str = "http://0.0.0.0:4000/embed";

/// Image embedding service configuration
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: 120,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_EMBED_SERVICE_URL)
    }
}

impl FromEnv for EmbeddingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            url: env_or_default("EMBED_SERVICE_URL", DEFAULT_EMBED_SERVICE_URL),
            timeout_secs: env_parse("EMBED_TIMEOUT_SECS", defaults.timeout_secs)?,
        })
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    nft_data: &'a EmbedBatch,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    response: Vec<VectorRecord>,
}

/// [`EmbeddingClient`] for the JSON-over-HTTP image embedding service
pub struct HttpEmbeddingClient {
    client: Client,
    config: EmbeddingConfig,
}

impl HttpEmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> NftResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NftError::Config(format!("Failed to build embedding client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    #[instrument(skip(self, batch), fields(batch = batch.index, size = batch.len()))]
    async fn embed(&self, batch: &EmbedBatch) -> NftResult<Vec<VectorRecord>> {
        let response = self
            .client
            .post(&self.config.url)
            .json(&EmbedRequest { nft_data: batch })
            .send()
            .await
            .map_err(|e| NftError::Embedding(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(NftError::Embedding(format!(
                "Embedding service error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| NftError::Embedding(format!("Invalid embedding response: {}", e)))?;

        debug!(vectors = body.response.len(), "Batch embedded");
        Ok(body.response)
    }
}
