//! Error types for the quiz pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for quiz pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// External service an upstream error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamService {
    /// Embedding model endpoint
    Embedding,
    /// Text-completion model endpoint
    Completion,
}

impl UpstreamService {
    /// Pipeline stage name used in error reports
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::Completion => "completion",
        }
    }
}

impl fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedding => write!(f, "embedding service"),
            Self::Completion => write!(f, "completion service"),
        }
    }
}

/// Quiz pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Embedding or persistence of a collection failed
    #[error("Indexing failed: {message}")]
    Indexing {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// No indexed segments under this collection id
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Quiz session unknown or expired
    #[error("Quiz not found: {0}")]
    QuizNotFound(Uuid),

    /// External service unreachable or failing
    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable {
        service: UpstreamService,
        message: String,
    },

    /// External service did not answer in time
    #[error("{service} timed out after {timeout_secs}s")]
    UpstreamTimeout {
        service: UpstreamService,
        timeout_secs: u64,
    },

    /// External service answered with something unusable
    #[error("{service} returned a malformed response: {message}")]
    UpstreamResponse {
        service: UpstreamService,
        message: String,
    },

    /// Collection store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an indexing error without an underlying cause
    pub fn indexing(message: impl Into<String>) -> Self {
        Self::Indexing {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an upstream/storage failure that happened while indexing
    pub fn indexing_caused_by(message: impl Into<String>, cause: Error) -> Self {
        Self::Indexing {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    /// Create a malformed upstream response error
    pub fn upstream_response(service: UpstreamService, message: impl Into<String>) -> Self {
        Self::UpstreamResponse {
            service,
            message: message.into(),
        }
    }

    /// Whether a retry could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::UpstreamTimeout { .. }
        )
    }

    /// Pipeline stage the error belongs to
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::InvalidInput(_) | Error::Json(_) => "request",
            Error::UnsupportedFileType(_) => "upload",
            Error::FileParse { .. } => "extraction",
            Error::Indexing { .. } => "indexing",
            Error::CollectionNotFound(_) => "retrieval",
            Error::QuizNotFound(_) => "grading",
            Error::UpstreamUnavailable { service, .. }
            | Error::UpstreamTimeout { service, .. }
            | Error::UpstreamResponse { service, .. } => service.stage(),
            Error::Storage(_) => "storage",
            Error::Io(_) | Error::Internal(_) => "internal",
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_)
            | Error::UnsupportedFileType(_)
            | Error::FileParse { .. }
            | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::CollectionNotFound(_) | Error::QuizNotFound(_) => StatusCode::NOT_FOUND,
            Error::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::UpstreamResponse { .. } => StatusCode::BAD_GATEWAY,
            Error::Indexing { source, .. } => source
                .as_ref()
                .map(|cause| cause.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Error::Config(_) | Error::Storage(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::UnsupportedFileType(_) => "unsupported_type",
            Error::FileParse { .. } => "parse_error",
            Error::Indexing { .. } => "indexing_error",
            Error::CollectionNotFound(_) => "collection_not_found",
            Error::QuizNotFound(_) => "quiz_not_found",
            Error::UpstreamUnavailable { .. } => "upstream_unavailable",
            Error::UpstreamTimeout { .. } => "upstream_timeout",
            Error::UpstreamResponse { .. } => "upstream_response",
            Error::Storage(_) => "storage_error",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let mut error = json!({
            "type": self.error_type(),
            "stage": self.stage(),
            "message": self.to_string(),
        });
        if let Error::Indexing {
            source: Some(cause),
            ..
        } = &self
        {
            error["cause"] = json!({
                "type": cause.error_type(),
                "stage": cause.stage(),
                "message": cause.to_string(),
            });
        }

        if status.is_server_error() {
            tracing::error!(stage = self.stage(), "{}", self);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing_status_follows_cause() {
        let err = Error::indexing_caused_by(
            "embedding failed",
            Error::UpstreamTimeout {
                service: UpstreamService::Embedding,
                timeout_secs: 30,
            },
        );
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.stage(), "indexing");

        assert_eq!(
            Error::indexing("bad vector").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_stages_distinguish_failures() {
        let missing = Error::CollectionNotFound("pdf-0000".to_string());
        let down = Error::UpstreamUnavailable {
            service: UpstreamService::Completion,
            message: "connection refused".to_string(),
        };
        assert_eq!(missing.stage(), "retrieval");
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(down.stage(), "completion");
        assert_eq!(down.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(down.is_retryable());
        assert!(!missing.is_retryable());
    }
}
