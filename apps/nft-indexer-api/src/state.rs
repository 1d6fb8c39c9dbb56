//! Application state management.
//!
//! This module defines the shared application state used to build the routes.
//! The state contains:
//! - Configuration
//! - MongoDB client
//! - The vector index handle, connected once at startup

use domain_nfts::VectorIndex;
use mongodb::{Client, Database};
use std::sync::Arc;

/// Shared application state.
///
/// Cloning is cheap; the MongoDB client shares its pool and the vector index
/// sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// MongoDB client (cloneable, shares underlying connection pool)
    pub mongo_client: Client,
    /// MongoDB database instance
    pub db: Database,
    /// Vector index every request upserts into
    pub vector_index: Arc<dyn VectorIndex>,
}
