//! Typed API error for HTTP handlers.
//!
//! Converts service errors into HTTP responses with a JSON body and a
//! status code, so handlers return `Result<Json<T>, ApiError>`.

use assess_report_service::ServiceError;
use assess_report_storage::StorageError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Converts to a JSON response: `{"error": "message"}`.
///
/// `Internal` logs the real error server-side and returns a static message
/// to the client.
#[derive(Debug)]
pub enum ApiError {
    /// 400: malformed query, body or enum value.
    BadRequest(String),
    /// 404: subject or its schedule does not exist.
    NotFound(String),
    /// 409: the subject is already complete.
    Conflict(String),
    /// 502: a required upstream provider failed.
    BadGateway(String),
    /// 503: the request was cancelled or a dependency is temporarily down.
    ServiceUnavailable(String),
    /// 500: unexpected failure. Details logged, not exposed.
    Internal(anyhow::Error),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::BadGateway(msg)
            | Self::ServiceUnavailable(msg) => msg,
            Self::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                "internal server error".to_owned()
            },
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { .. } => Self::NotFound(err.to_string()),
            ServiceError::Storage(StorageError::NotFound { entity, id }) => {
                Self::NotFound(format!("{entity} '{id}' not found"))
            },
            ServiceError::InvalidArgs(msg) => Self::BadRequest(msg),
            ServiceError::AlreadyComplete(_) => Self::Conflict(err.to_string()),
            ServiceError::Dependency { .. } => {
                tracing::warn!(error = %err, "upstream provider failed");
                Self::BadGateway(err.to_string())
            },
            ServiceError::Cancelled => Self::ServiceUnavailable(err.to_string()),
            ServiceError::Storage(ref e) if e.is_transient() => {
                tracing::warn!(error = %err, "storage temporarily unavailable");
                Self::ServiceUnavailable("storage temporarily unavailable".to_owned())
            },
            ServiceError::Storage(_) => Self::Internal(err.into()),
        }
    }
}
