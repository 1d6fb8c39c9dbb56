use async_graphql::ErrorExtensions;
use core_config::ConfigError;
use thiserror::Error;

/// Failure inside the batch pipeline, naming the unit of work that failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Embedding failed for batch {batch}: {reason}")]
    Embedding { batch: usize, reason: String },

    #[error("Upsert failed for batch {batch}: {reason}")]
    Upsert { batch: usize, reason: String },

    #[error("Persisting token {token_id} failed: {reason}")]
    Persist { token_id: String, reason: String },
}

#[derive(Debug, Error)]
pub enum NftError {
    #[error("{0}")]
    Validation(String),

    #[error("Provider error: {0}")]
    Provider(String),

    /// The provider answered without any result set
    #[error("{0}")]
    ProviderEmpty(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type NftResult<T> = Result<T, NftError>;

/// Machine-readable code attached to every GraphQL error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    IncompleteInput,
    UnexpectedError,
    InternalServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IncompleteInput => "INCOMPLETE_INPUT",
            ErrorCode::UnexpectedError => "UNEXPECTED_ERROR",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NftError {
    pub fn code(&self) -> ErrorCode {
        match self {
            NftError::Validation(_) => ErrorCode::IncompleteInput,
            NftError::Provider(_) | NftError::ProviderEmpty(_) => ErrorCode::UnexpectedError,
            _ => ErrorCode::InternalServerError,
        }
    }

    pub fn incomplete_input() -> Self {
        NftError::Validation("All fields are required".to_string())
    }

    pub fn provider_empty() -> Self {
        NftError::ProviderEmpty("An error occured".to_string())
    }
}

impl ErrorExtensions for NftError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code.as_str()))
    }
}

impl From<reqwest::Error> for NftError {
    fn from(err: reqwest::Error) -> Self {
        NftError::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for NftError {
    fn from(err: mongodb::error::Error) -> Self {
        NftError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for NftError {
    fn from(err: serde_json::Error) -> Self {
        NftError::Internal(format!("JSON error: {}", err))
    }
}

impl From<ConfigError> for NftError {
    fn from(err: ConfigError) -> Self {
        NftError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(NftError::incomplete_input().code(), ErrorCode::IncompleteInput);
        assert_eq!(NftError::provider_empty().code(), ErrorCode::UnexpectedError);
        assert_eq!(
            NftError::Provider("502".into()).code(),
            ErrorCode::UnexpectedError
        );
        assert_eq!(
            NftError::Database("down".into()).code(),
            ErrorCode::InternalServerError
        );

        let pipeline: NftError = PipelineError::Upsert {
            batch: 1,
            reason: "quota".into(),
        }
        .into();
        assert_eq!(pipeline.code(), ErrorCode::InternalServerError);
    }

    #[test]
    fn test_pipeline_message_names_the_failing_unit() {
        let err = NftError::from(PipelineError::Persist {
            token_id: "77".into(),
            reason: "duplicate".into(),
        });
        assert_eq!(err.to_string(), "Persisting token 77 failed: duplicate");
    }

    #[test]
    fn test_graphql_extension_carries_code() {
        let gql = NftError::incomplete_input().extend();
        assert_eq!(gql.message, "All fields are required");

        let extensions = gql.extensions.expect("extensions set");
        assert_eq!(
            extensions.get("code"),
            Some(&async_graphql::Value::from("INCOMPLETE_INPUT"))
        );
    }
}
