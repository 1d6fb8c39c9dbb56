use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::not_found;
use crate::http::cors::{cors_layer_from_env, create_permissive_cors_layer};
use crate::http::security::security_headers;
use axum::{Router, middleware};
use core_config::Environment;
use core_config::server::ServerConfig;
use std::io;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

/// Wraps application routes with the cross-cutting layers every service uses.
///
/// - HTTP tracing spans at INFO
/// - security headers
/// - CORS: permissive in development; in production the comma-separated
///   `CORS_ALLOWED_ORIGIN` list is required
/// - response compression
/// - JSON 404 fallback
///
/// Routes are mounted at the root; domain routers bring their own state.
pub fn create_router(routes: Router, environment: &Environment) -> io::Result<Router> {
    let cors = if environment.is_production() {
        cors_layer_from_env()?
    } else {
        create_permissive_cors_layer()
    };

    let router = routes
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(CompressionLayer::new());

    Ok(router)
}

/// Serve `router` until SIGINT/SIGTERM, then run `cleanup` under `shutdown_timeout`.
///
/// The cleanup future only starts once the shutdown signal has been received,
/// and the function returns after both the server and the cleanup are done.
///
/// # Example
/// ```ignore
/// create_production_app(router, &config.server, Duration::from_secs(30), async move {
///     close_mongodb(client, "main").await;
/// })
/// .await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (coordinator, _rx) = ShutdownCoordinator::new();
    let cleanup_waiter = coordinator.clone();
    let server_waiter = coordinator.clone();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let cleanup_handle = tokio::spawn(async move {
        cleanup_waiter.wait_for_shutdown().await;

        info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
        match tokio::time::timeout(shutdown_timeout, cleanup).await {
            Ok(()) => info!("Cleanup completed successfully"),
            Err(_) => tracing::warn!(
                "Cleanup exceeded timeout of {:?}, forcing shutdown",
                shutdown_timeout
            ),
        }
    });

    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { server_waiter.wait_for_shutdown().await })
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        });

    // The server can also stop on its own (bind/accept failure); make sure
    // the cleanup task is released in that case too.
    coordinator.shutdown();
    cleanup_handle.await.ok();

    serve_result
}
