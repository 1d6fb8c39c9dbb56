use async_graphql::{InputObject, SimpleObject};
use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeMap};
use serde_json::Value;
use std::collections::HashMap;

/// Chain used when a request does not name one (Ethereum mainnet)
pub const DEFAULT_CHAIN: &str = "0x1";

/// Number of image entries sent to the embedding service per call
pub const BATCH_SIZE: usize = 10;

/// Metadata fields the provider extracts from the raw token metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub attributes: Option<Value>,
}

/// An NFT held by a wallet, as returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NftItem {
    pub token_id: String,
    #[serde(default)]
    pub token_address: Option<String>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub token_hash: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
    /// Raw token metadata. The provider ships it as a JSON-encoded string.
    #[serde(default, deserialize_with = "metadata_from_string")]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub normalized_metadata: Option<NormalizedMetadata>,
}

impl NftItem {
    pub fn new(token_id: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            ..Default::default()
        }
    }

    pub fn with_token_address(mut self, token_address: impl Into<String>) -> Self {
        self.token_address = Some(token_address.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        let normalized = self.normalized_metadata.get_or_insert_with(Default::default);
        normalized.image = Some(image.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Parse string-encoded metadata, keeping the raw string when it is not JSON.
fn metadata_from_string<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.map(|value| match value {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }))
}

/// A transfer event touching a wallet, as returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NftTransfer {
    #[serde(default)]
    pub token_address: String,
    #[serde(default)]
    pub token_id: String,
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default)]
    pub to_address: Option<String>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub block_timestamp: Option<String>,
}

impl NftTransfer {
    /// Whether this transfer delivered the token to `address` (case-insensitive).
    pub fn is_received_by(&self, address: &str) -> bool {
        self.to_address
            .as_deref()
            .is_some_and(|to| to.eq_ignore_ascii_case(address))
    }
}

/// Ordered map of token id to resolved image URL.
///
/// Keeps first-insertion order; inserting an existing token id replaces its
/// URL in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedImageMap {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl ResolvedImageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token_id: impl Into<String>, image_url: impl Into<String>) {
        let token_id = token_id.into();
        let image_url = image_url.into();
        match self.positions.get(&token_id) {
            Some(&position) => self.entries[position].1 = image_url,
            None => {
                self.positions.insert(token_id.clone(), self.entries.len());
                self.entries.push((token_id, image_url));
            }
        }
    }

    pub fn get(&self, token_id: &str) -> Option<&str> {
        self.positions
            .get(token_id)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(token_id, image_url)| (token_id.as_str(), image_url.as_str()))
    }

    /// Split into contiguous batches of at most `size` entries.
    ///
    /// A `size` of zero is treated as one.
    pub fn batches(&self, size: usize) -> Vec<EmbedBatch> {
        self.entries
            .chunks(size.max(1))
            .enumerate()
            .map(|(index, chunk)| EmbedBatch {
                index,
                entries: chunk.to_vec(),
            })
            .collect()
    }
}

/// One slice of the image map submitted to the embedding service.
///
/// Serializes as the `nft_data` object: token id keys in batch order.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedBatch {
    /// Position of this batch within its run
    pub index: usize,
    pub entries: Vec<(String, String)>,
}

impl EmbedBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn token_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(token_id, _)| token_id.as_str())
    }
}

impl Serialize for EmbedBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (token_id, image_url) in &self.entries {
            map.serialize_entry(token_id, image_url)?;
        }
        map.end()
    }
}

/// An embedding produced for one token, upserted into the vector index as is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Document stored in the `nftdatas` collection for every indexed NFT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedNftRecord {
    pub token_id: String,
    #[serde(default)]
    pub token_address: String,
    #[serde(default)]
    pub contract_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub token_hash: String,
    #[serde(default)]
    pub token_uri: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub metadata_description: String,
    #[serde(default)]
    pub metadata_attributes: Value,
    #[serde(default)]
    pub owner_address: String,
    /// Stored as a BSON date
    #[serde(rename = "createdAt", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl PersistedNftRecord {
    /// Build the stored document for `item`, held by `owner`.
    ///
    /// `image_url` keeps the provider's normalized image untouched; the gateway
    /// rewrite only applies to what is sent for embedding.
    pub fn from_item(item: &NftItem, owner: &str) -> Self {
        let normalized = item.normalized_metadata.as_ref();
        let now = Utc::now();

        let metadata_description = normalized
            .and_then(|m| m.description.clone())
            .or_else(|| item.metadata.as_ref().map(render_metadata))
            .unwrap_or_default();

        let metadata_attributes = normalized
            .and_then(|m| m.attributes.clone())
            .unwrap_or_else(|| Value::String(String::new()));

        Self {
            token_id: item.token_id.clone(),
            token_address: item.token_address.clone().unwrap_or_default(),
            contract_type: item.contract_type.clone().unwrap_or_default(),
            name: item.name.clone().unwrap_or_default(),
            symbol: item.symbol.clone().unwrap_or_default(),
            token_hash: item.token_hash.clone().unwrap_or_default(),
            token_uri: item.token_uri.clone().unwrap_or_default(),
            image_url: normalized.and_then(|m| m.image.clone()).unwrap_or_default(),
            metadata_description,
            metadata_attributes,
            owner_address: owner.to_lowercase(),
            created_at: now,
            updated_at: now,
        }
    }
}

fn render_metadata(metadata: &Value) -> String {
    match metadata {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Input accepted by the indexing mutations
///
/// `address` is optional at the schema level so a missing address reaches the
/// resolver and is reported as `INCOMPLETE_INPUT`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, InputObject)]
#[graphql(name = "nftVariables")]
pub struct IndexRequest {
    pub address: Option<String>,
    pub chain: Option<String>,
}

impl IndexRequest {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            chain: None,
        }
    }

    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = Some(chain.into());
        self
    }

    /// Requested chain, or [`DEFAULT_CHAIN`] when absent or blank.
    pub fn chain_or_default(&self) -> &str {
        self.chain
            .as_deref()
            .map(str::trim)
            .filter(|chain| !chain.is_empty())
            .unwrap_or(DEFAULT_CHAIN)
    }
}

/// Outcome reported to the caller of an indexing mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[graphql(name = "requestResponse")]
pub struct RequestResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl RequestResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

/// Counts gathered by one successful pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub items: usize,
    pub batches: usize,
    pub vectors_upserted: u32,
    pub records_persisted: usize,
}
