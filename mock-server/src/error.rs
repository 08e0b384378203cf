use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0}")]
    Validation(String),

    /// A numeric query filter that did not parse, named by its parameter.
    #[error("Invalid {0} parameter")]
    InvalidFilter(&'static str),

    #[error("Not found.")]
    NotFound,

    #[error("Invalid page.")]
    InvalidPage,

    /// The signing provider refused the call.
    #[error("{0}")]
    Provider(String),
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            BackendError::Validation(detail) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation error", "detail": detail }),
            ),
            BackendError::InvalidFilter(_) => (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() })),
            BackendError::NotFound | BackendError::InvalidPage => {
                (StatusCode::NOT_FOUND, json!({ "detail": self.to_string() }))
            }
            BackendError::Provider(detail) => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "error": "Signing provider error",
                    "detail": detail,
                    "code": "PROVIDER_ERROR",
                }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
