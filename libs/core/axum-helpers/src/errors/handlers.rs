use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::ErrorResponse;

/// Fallback handler for unknown routes.
pub async fn not_found() -> Response {
    let body = Json(ErrorResponse::new(
        "NOT_FOUND",
        "The requested resource was not found",
    ));

    (StatusCode::NOT_FOUND, body).into_response()
}
