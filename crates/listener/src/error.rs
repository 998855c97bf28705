use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failures that stop the HTTP server.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("http server exited unexpectedly: {0}")]
    Serve(#[source] std::io::Error),
}

/// Rejection of a webhook request, rendered as its HTTP response.
///
/// Malformed requests get a plain-text body naming the problem; every other
/// error is a JSON `{"error": ...}` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookError {
    BadRequest(String),
    Unauthorized,
    NotFound,
    /// Details go to the log, never to the caller.
    Internal(&'static str),
}

impl WebhookError {
    pub fn missing(field: &str) -> Self {
        Self::BadRequest(format!("Missing {field}"))
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            WebhookError::BadRequest(message) => {
                return (StatusCode::BAD_REQUEST, message).into_response();
            }
            WebhookError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "No Jules token found. Register with /webhook/token first.",
            ),
            WebhookError::NotFound => (StatusCode::NOT_FOUND, "No GitHub repositories found."),
            WebhookError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
