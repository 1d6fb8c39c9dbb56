//! NFT data provider seam

mod moralis;

use async_trait::async_trait;

use crate::error::NftResult;
use crate::models::{NftItem, NftTransfer};

pub use moralis::{MoralisConfig, MoralisProvider};

/// Source of wallet holdings and transfer history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NftProvider: Send + Sync {
    /// Every NFT currently held by `address` on `chain`.
    async fn wallet_nfts(&self, address: &str, chain: &str) -> NftResult<Vec<NftItem>>;

    /// Most recent transfers touching `address`, newest first.
    async fn wallet_transfers(
        &self,
        address: &str,
        chain: &str,
        limit: u32,
    ) -> NftResult<Vec<NftTransfer>>;
}
