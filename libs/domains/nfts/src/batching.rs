use crate::models::{BATCH_SIZE, EmbedBatch, NftItem, ResolvedImageMap};
use crate::normalizer::resolve_image_url;

/// Resolve every item's image, keyed by token id in provider order.
pub fn build_image_map(items: &[NftItem]) -> ResolvedImageMap {
    let mut map = ResolvedImageMap::new();
    for item in items {
        map.insert(item.token_id.clone(), resolve_image_url(item));
    }
    map
}

/// Image map for `items` split into [`BATCH_SIZE`] batches.
pub fn embed_batches(items: &[NftItem]) -> Vec<EmbedBatch> {
    build_image_map(items).batches(BATCH_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_token_ids_collapse() {
        let items = vec![
            NftItem::new("1").with_image("https://a"),
            NftItem::new("2").with_image("https://b"),
            NftItem::new("1").with_image("https://c"),
        ];

        let map = build_image_map(&items);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("1"), Some("https://c"));
    }

    #[test]
    fn test_twenty_five_items_make_three_batches() {
        let items: Vec<_> = (0..25)
            .map(|i| NftItem::new(i.to_string()).with_image(format!("ipfs://{i}")))
            .collect();

        let batches = embed_batches(&items);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].entries[0].1, "https://ipfs.io/ipfs/0");
        assert_eq!(batches.iter().map(EmbedBatch::len).sum::<usize>(), 25);
    }

    #[test]
    fn test_items_without_images_are_still_batched() {
        let batches = embed_batches(&[NftItem::new("1")]);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].entries[0], ("1".to_string(), String::new()));
    }
}
