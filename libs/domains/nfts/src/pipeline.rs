//! Batch pipeline: embed + upsert every image batch while persisting every item

use core_config::{ConfigError, FromEnv, env_parse};
use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::batching::embed_batches;
use crate::embedding::EmbeddingClient;
use crate::error::{NftResult, PipelineError};
use crate::models::{EmbedBatch, NftItem, PersistedNftRecord, PipelineReport};
use crate::repository::NftRepository;
use crate::vector::VectorIndex;

pub const DEFAULT_CONCURRENCY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// In-flight tasks per stage
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl FromEnv for PipelineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            concurrency: env_parse("PIPELINE_CONCURRENCY", DEFAULT_CONCURRENCY)?.max(1),
        })
    }
}

/// Runs the index stage and the persist stage for one wallet.
///
/// Both stages run concurrently and each keeps up to `concurrency` tasks in
/// flight. The first failure ends the run: every task still pending in either
/// stage is dropped. Writes that already completed are kept.
pub struct BatchPipeline {
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    repository: Arc<dyn NftRepository>,
    concurrency: usize,
}

impl BatchPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        repository: Arc<dyn NftRepository>,
    ) -> Self {
        Self {
            embedder,
            index,
            repository,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.concurrency = config.concurrency.max(1);
        self
    }

    #[instrument(skip(self, owner, items), fields(owner = %owner, items = items.len()))]
    pub async fn run(&self, owner: &str, items: &[NftItem]) -> NftResult<PipelineReport> {
        let batches = embed_batches(items);
        let batch_count = batches.len();

        let (vectors_upserted, records_persisted) =
            futures::try_join!(self.index_batches(batches), self.persist_items(owner, items))?;

        let report = PipelineReport {
            items: items.len(),
            batches: batch_count,
            vectors_upserted,
            records_persisted,
        };
        info!(
            index = self.index.name(),
            batches = report.batches,
            vectors = report.vectors_upserted,
            records = report.records_persisted,
            "Pipeline completed"
        );
        Ok(report)
    }

    async fn index_batches(&self, batches: Vec<EmbedBatch>) -> Result<u32, PipelineError> {
        stream::iter(batches.into_iter().map(Ok::<_, PipelineError>))
            .map_ok(|batch| self.index_batch(batch))
            .try_buffer_unordered(self.concurrency)
            .try_fold(0u32, |total, upserted| async move { Ok(total + upserted) })
            .await
    }

    async fn index_batch(&self, batch: EmbedBatch) -> Result<u32, PipelineError> {
        let records = self
            .embedder
            .embed(&batch)
            .await
            .map_err(|e| PipelineError::Embedding {
                batch: batch.index,
                reason: e.to_string(),
            })?;

        let upserted = self
            .index
            .upsert(records)
            .await
            .map_err(|e| PipelineError::Upsert {
                batch: batch.index,
                reason: e.to_string(),
            })?;

        debug!(batch = batch.index, upserted, "Batch indexed");
        Ok(upserted)
    }

    async fn persist_items(&self, owner: &str, items: &[NftItem]) -> Result<usize, PipelineError> {
        stream::iter(items.iter().map(Ok::<_, PipelineError>))
            .map_ok(|item| self.persist_item(owner, item))
            .try_buffer_unordered(self.concurrency)
            .boxed()
            .try_fold(0usize, |count, ()| async move { Ok(count + 1) })
            .await
    }

    async fn persist_item(&self, owner: &str, item: &NftItem) -> Result<(), PipelineError> {
        let record = PersistedNftRecord::from_item(item, owner);
        self.repository
            .insert(record)
            .await
            .map_err(|e| PipelineError::Persist {
                token_id: item.token_id.clone(),
                reason: e.to_string(),
            })
    }
}
