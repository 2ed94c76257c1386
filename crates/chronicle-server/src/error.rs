//! HTTP error mapping.
//!
//! Translates engine errors into response classes: a missing event is 404,
//! caller mistakes (bad arguments, merge conflicts, invalid records) are
//! 400, everything else — driver failures, corrupt stored documents — is a
//! generic 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;
use tracing::error;

use chronicle_core::ValidationError;
use chronicle_store::StoreError;

/// An error ready to be rendered as an HTTP response.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 404 — the requested event does not exist.
    #[error("{0}")]
    NotFound(String),

    /// 400 — the request itself is at fault.
    #[error("{0}")]
    BadRequest(String),

    /// 500 — storage or internal failure.
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound(err.to_string()),
            StoreError::InvalidArgument(_)
            | StoreError::MergeConflict(_)
            | StoreError::Validation(_) => Self::BadRequest(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Internal(message) => {
                error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_404() {
        let err: ApiError = StoreError::NotFound("evt-1".into()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn invalid_argument_maps_to_400() {
        let err: ApiError = StoreError::InvalidArgument("count".into()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn merge_conflict_maps_to_400() {
        let err: ApiError = StoreError::MergeConflict("source_id".into()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn validation_maps_to_400() {
        let err: ApiError = ValidationError::EmptyId.into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn corrupt_document_maps_to_500() {
        let err: ApiError = StoreError::InvalidTagFormat("junk".into()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn corrupt_time_array_maps_to_500() {
        let err: ApiError = StoreError::InvalidTimeArray(3).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
