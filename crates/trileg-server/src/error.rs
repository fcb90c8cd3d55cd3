//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The OAuth flow halted; the message is safe to show the user.
    #[error("{0}")]
    Flow(String),

    /// The blocking flow task panicked or was cancelled.
    #[error("Flow task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Flow(_) => StatusCode::BAD_GATEWAY,
            Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, axum::Json(json!({"error": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_error_is_bad_gateway() {
        let response = ServerError::Flow("Authorization was denied.".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_flow_error_display_is_message() {
        let err = ServerError::Flow("Request token retrieval failed.".to_owned());
        assert_eq!(err.to_string(), "Request token retrieval failed.");
    }
}
