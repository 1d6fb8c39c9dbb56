pub mod handlers;

use serde::Serialize;

/// JSON body returned by plain HTTP error handlers.
///
/// GraphQL failures are reported in the GraphQL response itself; this shape
/// is only used for routing-level errors such as unknown paths.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }
}
