//! API routes module
//!
//! This module defines all HTTP routes of the NFT indexer.

pub mod health;
pub mod nfts;

use axum::Router;

use crate::state::AppState;

/// Create all API routes
pub fn routes(state: &AppState) -> eyre::Result<Router> {
    Ok(Router::new()
        .merge(nfts::router(state)?)
        .merge(health::router(state.clone())))
}
