//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ErrorKind};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The request carried no `x-org-id` identity header.
    MissingIdentity,
    /// Route exists but the path names no known action.
    UnknownAction(String),
    /// Domain logic error.
    Domain(DomainError),
}

/// HTTP status for each error classification.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists
        | ErrorKind::InvalidTransition
        | ErrorKind::InvalidPaymentBranch
        | ErrorKind::CodStatusMismatch => StatusCode::CONFLICT,
        ErrorKind::Unauthorized | ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::MissingDeliveryTimestamp
        | ErrorKind::TooEarly
        | ErrorKind::ReturnWindowExpired => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::MalformedInput => StatusCode::BAD_REQUEST,
        ErrorKind::Ledger | ErrorKind::Serialization => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::MissingIdentity => (
                StatusCode::UNAUTHORIZED,
                "missing_identity",
                "x-org-id header is required".to_string(),
            ),
            ApiError::UnknownAction(action) => (
                StatusCode::NOT_FOUND,
                "unknown_action",
                format!("unknown order action: {action}"),
            ),
            ApiError::Domain(err) => {
                let kind = err.kind();
                let status = status_for(kind);
                if status.is_server_error() {
                    tracing::error!(error = %err, "internal server error");
                }
                (status, kind.as_str(), err.to_string())
            }
        };

        metrics::counter!(
            "api_error_responses_total",
            "status" => status.as_u16().to_string(),
            "kind" => kind
        )
        .increment(1);

        let body = serde_json::json!({ "error": message, "kind": kind });
        (status, axum::Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<domain::OrderError> for ApiError {
    fn from(err: domain::OrderError) -> Self {
        ApiError::Domain(err.into())
    }
}
