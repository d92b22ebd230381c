//! Chronicle API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chronicle_core::error::DomainError;
use chronicle_event_store::SqlError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection error.
    #[error("database error: {0}")]
    Database(#[from] SqlError),

    /// Store or codec setup failed.
    #[error("store error: {0}")]
    Store(#[from] DomainError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            DomainError::AggregateNotFound(_) => (StatusCode::NOT_FOUND, "aggregate_not_found"),
            DomainError::VersionConflict { .. } => (StatusCode::CONFLICT, "version_conflict"),
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            DomainError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            DomainError::Publication(_) => (StatusCode::INTERNAL_SERVER_ERROR, "publication_error"),
            DomainError::UnknownEventType(_)
            | DomainError::DuplicateEventType(_)
            | DomainError::MalformedPayload { .. }
            | DomainError::CorruptHistory { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "event_data_error")
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::event::AggregateId;

    fn status_of(err: DomainError) -> StatusCode {
        let response = ApiError(err).into_response();
        response.status()
    }

    #[test]
    fn test_aggregate_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::AggregateNotFound(AggregateId::new("t-1"))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_version_conflict_maps_to_409() {
        assert_eq!(
            status_of(DomainError::VersionConflict {
                aggregate_type: "todo".into(),
                aggregate_id: AggregateId::new("t-1"),
                version: 2,
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(DomainError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_storage_maps_to_500() {
        assert_eq!(
            status_of(DomainError::Storage("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_corrupt_history_maps_to_500() {
        assert_eq!(
            status_of(DomainError::CorruptHistory {
                aggregate_id: AggregateId::new("t-1"),
                expected: 2,
                found_aggregate_id: AggregateId::new("t-1"),
                found: 3,
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
