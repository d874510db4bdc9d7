use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::utils::validation::field_errors;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Too many requests: {0}")]
    RateLimited(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Dependency unavailable: {0}")]
    Dependency(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Excel export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) | Error::PreconditionFailed(_) | Error::ConcurrentModification(_) => {
                StatusCode::CONFLICT
            }
            Error::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Dependency(_) | Error::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Config(_) | Error::Database(_) | Error::Internal(_) | Error::Xlsx(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code carried in every error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "BAD_REQUEST",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Conflict(_) => "CONFLICT",
            Error::InvalidTransition(_) => "INVALID_TRANSITION",
            Error::PreconditionFailed(_) => "PRECONDITION_FAILED",
            Error::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::Forbidden(_) => "FORBIDDEN",
            Error::RateLimited(_) => "RATE_LIMITED",
            Error::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Error::Dependency(_) => "DEPENDENCY_ERROR",
            Error::Timeout(_) => "TIMEOUT",
            Error::Config(_) | Error::Database(_) | Error::Internal(_) | Error::Xlsx(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Error::ConcurrentModification(_) | Error::Timeout(_) | Error::Dependency(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        let body = match self {
            Error::Validation(errors) => json!({
                "success": false,
                "message": "Validation failed",
                "code": code,
                "errors": field_errors(&errors),
            }),
            Error::Database(_) | Error::Internal(_) | Error::Config(_) | Error::Xlsx(_) => json!({
                "success": false,
                "message": "An unexpected error occurred",
                "code": code,
            }),
            other => json!({
                "success": false,
                "message": other.to_string(),
                "code": code,
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Error::Dependency(err.to_string())
            }
            sqlx::Error::Database(ref db) => {
                if db.is_unique_violation() {
                    Error::Conflict("A record with the same unique value already exists".to_string())
                } else if db.is_foreign_key_violation() {
                    Error::PreconditionFailed("A referenced record does not exist".to_string())
                } else if matches!(db.code().as_deref(), Some("40P01") | Some("40001")) {
                    Error::ConcurrentModification(
                        "The record was modified concurrently, retry the request".to_string(),
                    )
                } else {
                    Error::Database(err)
                }
            }
            other => Error::Database(other),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Error::PayloadTooLarge(rejection.body_text());
        }
        Error::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value as JsonValue;
    use validator::{ValidationError, ValidationErrors};

    async fn body_of(err: Error) -> (StatusCode, JsonValue) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_envelope_lists_every_field() {
        let mut errors = ValidationErrors::new();
        errors.add("email", ValidationError::new("email"));
        errors.add("deadline", ValidationError::new("deadline_order"));

        let (status, body) = body_of(Error::Validation(errors)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["deadline", "email"]);
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let (status, body) = body_of(Error::Internal("pool state corrupt".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An unexpected error occurred");
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(Error::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            Error::InvalidTransition("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(Error::Timeout("x".into()).status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            Error::RateLimited("x".into()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert!(Error::ConcurrentModification("x".into()).is_retriable());
        assert!(!Error::NotFound("x".into()).is_retriable());
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert_eq!(err.code(), "NOT_FOUND");
        let err: Error = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.code(), "DEPENDENCY_ERROR");
    }
}
