//! Unified error handling for HTTP handlers.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::prediction::PredictionError;

/// Application-level error type returned by every handler.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),

    /// Body missing, not JSON, or of the wrong shape.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] JsonRejection),

    /// Missing or rejected bearer token.
    #[error("{0}")]
    Unauthorized(String),

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Auth(AuthError::InvalidCredentials) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Auth(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Prediction(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Don't expose internal error details to clients
        let body = match &self {
            _ if status.is_server_error() => {
                tracing::error!(error = %self, "request failed");
                json!({ "error": "Internal server error" })
            }
            Self::Prediction(PredictionError::MissingFeatures(names)) => json!({
                "error": "Missing features",
                "missing_features": names,
            }),
            Self::Prediction(PredictionError::InvalidFeatures(names)) => json!({
                "error": "Invalid feature values",
                "invalid_features": names,
            }),
            Self::InvalidJson(rejection) => {
                tracing::debug!(error = %rejection, "rejected request body");
                json!({ "error": "Invalid JSON body" })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
