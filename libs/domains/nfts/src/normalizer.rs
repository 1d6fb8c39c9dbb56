//! Image URL resolution for embedding requests

use serde_json::Value;

use crate::models::NftItem;

const IPFS_SCHEME: &str = "ipfs://";
const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";

/// Pick the image URL sent to the embedding service for `item`.
///
/// The provider's normalized image wins and has its `ipfs://` scheme routed
/// through the public gateway. Otherwise the raw metadata `image` string is
/// used verbatim. Items with neither resolve to an empty string.
pub fn resolve_image_url(item: &NftItem) -> String {
    let normalized = item
        .normalized_metadata
        .as_ref()
        .and_then(|m| m.image.as_deref())
        .filter(|image| !image.is_empty());

    if let Some(image) = normalized {
        return rewrite_ipfs(image);
    }

    item.metadata
        .as_ref()
        .and_then(|metadata| metadata.get("image"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Replace a leading `ipfs://` with the HTTP gateway prefix.
pub fn rewrite_ipfs(url: &str) -> String {
    match url.strip_prefix(IPFS_SCHEME) {
        Some(path) => format!("{IPFS_GATEWAY}{path}"),
        None => url.to_string(),
    }
}
