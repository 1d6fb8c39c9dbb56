use async_graphql::http::GraphiQLSource;
use axum::{
    Json, Router,
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
};
use std::sync::Arc;

use crate::graphql::{NftSchema, build_schema};
use crate::service::NftService;

pub const GRAPHQL_PATH: &str = "/graphql";

/// Create the router serving the GraphQL endpoint and its GraphiQL page
pub fn router(service: NftService) -> Router {
    schema_router(build_schema(Arc::new(service)))
}

/// Router over an already built schema
pub fn schema_router(schema: NftSchema) -> Router {
    Router::new()
        .route(GRAPHQL_PATH, get(graphiql).post(graphql))
        .with_state(schema)
}

/// Execute one GraphQL request
async fn graphql(
    State(schema): State<NftSchema>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(schema.execute(request).await)
}

/// Interactive GraphiQL explorer
async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}
