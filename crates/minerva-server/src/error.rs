//! HTTP error mapping for the generic chat endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use minerva_ai::AiError;
use serde_json::json;

/// Wraps orchestrator failures for axum. Invalid input is the caller's
/// fault; everything else means the backend could not be reached.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ServerError(#[from] AiError);

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AiError::EmptyInput => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        // The short error display only; response bodies from the
        // backend were already truncated at the client.
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_maps_to_bad_request() {
        let response = ServerError(AiError::EmptyInput).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn backend_failure_maps_to_bad_gateway() {
        let response = ServerError(AiError::BackendUnavailable {
            status: 503,
            body: "overloaded".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
