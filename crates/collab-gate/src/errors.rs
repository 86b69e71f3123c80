//! Collab Gate error types.
//!
//! `GateError` is the admission failure taxonomy shared by every transport.
//! It maps to HTTP status codes via the `IntoResponse` impl so the WebSocket
//! transport can refuse an upgrade before the handshake completes. Messages
//! are generic; causes are logged server-side with room context only.

use crate::auth::KeyError;
use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Admission failure.
///
/// Maps to HTTP status codes:
/// - MissingCredential, InvalidCredential, MissingIdentity: 401 Unauthorized
/// - InvalidRoom: 400 Bad Request
/// - PermissionServiceUnavailable: 503 Service Unavailable
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Missing credential")]
    MissingCredential,

    /// Room names that cannot be a single URL path segment (`.`, `..`).
    #[error("The room name is not addressable")]
    InvalidRoom,

    #[error("The credential is invalid or expired")]
    InvalidCredential,

    #[error("The credential does not identify a user")]
    MissingIdentity,

    #[error("Permission service unavailable: {0}")]
    PermissionServiceUnavailable(String),
}

impl GateError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            GateError::MissingCredential
            | GateError::InvalidCredential
            | GateError::MissingIdentity => 401,
            GateError::InvalidRoom => 400,
            GateError::PermissionServiceUnavailable(_) => 503,
        }
    }

    /// Bounded label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GateError::MissingCredential => "missing_credential",
            GateError::InvalidCredential => "invalid_credential",
            GateError::MissingIdentity => "missing_identity",
            GateError::InvalidRoom => "invalid_room",
            GateError::PermissionServiceUnavailable(_) => "permission_service_unavailable",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            GateError::MissingCredential => (
                StatusCode::UNAUTHORIZED,
                "MISSING_CREDENTIAL",
                "A credential is required to join this room".to_string(),
            ),
            GateError::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIAL",
                "The credential is invalid or expired".to_string(),
            ),
            GateError::MissingIdentity => (
                StatusCode::UNAUTHORIZED,
                "MISSING_IDENTITY",
                "The credential does not identify a user".to_string(),
            ),
            GateError::InvalidRoom => (
                StatusCode::BAD_REQUEST,
                "INVALID_ROOM",
                "The room name is not addressable".to_string(),
            ),
            GateError::PermissionServiceUnavailable(reason) => {
                // Log actual reason server-side
                tracing::warn!(target: "gate.availability", reason = %reason, "Permission service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PERMISSION_SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) =
                "Bearer realm=\"collab-gate\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

/// Fatal startup failure. The process must not serve connections after one.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid verification key: {0}")]
    Key(#[from] KeyError),

    #[error("Invalid permission callback URL: {0}")]
    PermCallbackUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Failed to listen to port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}
