//! Database connectors and utilities
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB client, config, health checks
//! - `config` - `core_config::FromEnv` for the database configs
//!
//! ## MongoDB
//!
//! ```ignore
//! use database::mongodb;
//!
//! let config = mongodb::MongoConfig::new("mongodb://localhost:27017/nft");
//! let client = mongodb::connect_from_config_with_retry(&config, None).await?;
//! let db = client.database(config.database());
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
