use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::debug;

use crate::slug::SlugError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::GroupNotFound(_) | StoreError::EventNotFound(_) => {
                ApiError::NotFound(value.to_string())
            }
            StoreError::DuplicateGroup(_) => ApiError::Conflict(value.to_string()),
        }
    }
}

/// Identity errors raised while handling admin input. Timetable lookups map
/// slug failures to [`ApiError::NotFound`] themselves.
impl From<SlugError> for ApiError {
    fn from(value: SlugError) -> Self {
        debug!(error = %value, "rejected group identity");
        ApiError::BadRequest(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_readable() {
        let err = ApiError::from(StoreError::DuplicateGroup("24.B01-vshm".to_string()));
        assert_eq!(err.to_string(), "conflict: Group 24.B01-vshm already exists");

        let err = ApiError::BadRequest("Cannot infer program for group B40".to_string());
        assert_eq!(err.to_string(), "bad request: Cannot infer program for group B40");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Unauthorized(String::new()), StatusCode::UNAUTHORIZED),
            (ApiError::Conflict(String::new()), StatusCode::CONFLICT),
            (ApiError::from(StoreError::EventNotFound(3)), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
