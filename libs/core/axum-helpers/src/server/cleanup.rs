//! Connection cleanup helpers run during graceful shutdown.

use tracing::info;

/// Close a MongoDB client, waiting for in-flight operations to finish.
///
/// # Example
/// ```ignore
/// use axum_helpers::server::close_mongodb;
///
/// close_mongodb(client, "main").await;
/// ```
pub async fn close_mongodb(client: mongodb::Client, name: &str) {
    info!("Closing MongoDB client '{}'", name);
    client.shutdown().await;
    info!("MongoDB client '{}' closed successfully", name);
}
