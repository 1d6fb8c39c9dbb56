//! HTTP middleware: CORS and security headers.

pub mod cors;
pub mod security;

pub use cors::{
    CORS_ALLOWED_ORIGIN, cors_layer_from_env, create_cors_layer, create_permissive_cors_layer,
    parse_origins,
};
pub use security::security_headers;
