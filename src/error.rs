/*
 * Responsibility
 * - Gateway-wide AppError
 * - IntoResponse (HTTP status / JSON error body)
 * - Authentication failures collapse to a bare 401 with no body
 * - Upstream / identity errors map to 502 / 504
 * - Oversized request body → 413, superseded identity sync → 409
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::authz::IdentityError;
use crate::services::upstream::UpstreamError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("{code}: {message}")]
    Conflict { code: &'static str, message: String },
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("bad gateway: {0}")]
    BadGateway(String),
    #[error("gateway timeout")]
    GatewayTimeout,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            // No detail leaks to the client; the reason is in the audit log.
            AppError::Unauthorized => return StatusCode::UNAUTHORIZED.into_response(),
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{resource} not found."),
            ),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, code, message),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "request body exceeds the configured limit".into(),
            ),
            AppError::BadGateway(_) => (
                StatusCode::BAD_GATEWAY,
                "BAD_GATEWAY",
                "upstream unavailable".into(),
            ),
            AppError::GatewayTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "GATEWAY_TIMEOUT",
                "upstream timed out".into(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<UpstreamError> for AppError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::RequestBody(_) => {
                AppError::bad_request("INVALID_REQUEST_BODY", "failed to read request body")
            }
            UpstreamError::PayloadTooLarge => AppError::PayloadTooLarge,
            UpstreamError::Timeout => AppError::GatewayTimeout,
            UpstreamError::Unavailable(_) | UpstreamError::InvalidResponse(_) => {
                AppError::BadGateway(e.to_string())
            }
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        match &e {
            IdentityError::Transport(err) if err.is_timeout() => AppError::GatewayTimeout,
            IdentityError::Stale => AppError::Conflict {
                code: "SYNC_CONFLICT",
                message: "authorization set changed during sync; retry".into(),
            },
            _ => AppError::BadGateway(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unauthorized_has_empty_body() {
        let res = AppError::Unauthorized.into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn upstream_errors_map_to_gateway_statuses() {
        assert_eq!(
            AppError::from(UpstreamError::Timeout).into_response().status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::from(UpstreamError::InvalidResponse("x".into()))
                .into_response()
                .status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn oversized_body_is_payload_too_large() {
        assert_eq!(
            AppError::from(UpstreamError::PayloadTooLarge)
                .into_response()
                .status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn stale_sync_is_conflict() {
        assert_eq!(
            AppError::from(IdentityError::Stale).into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn not_found_is_json() {
        let res = AppError::not_found("route").into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            res.headers()[axum::http::header::CONTENT_TYPE],
            "application/json"
        );
    }
}
