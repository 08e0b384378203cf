//! Error types for the signdesk API client.
//!
//! # Design
//! Every failure the gateway can observe is folded into one `ApiError` so the
//! presentation layer has a single taxonomy to render. HTTP variants carry the
//! optional `detail` string the backend puts in its JSON error bodies; the
//! `Display` output is the human-readable message with that detail appended.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the gateway, the document store and the company
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (connect, DNS, body read).
    #[error("Client Error: {0}")]
    Transport(String),

    #[error("Bad Request - Please check your input{}", suffix(.detail))]
    BadRequest { detail: Option<String> },

    #[error("Unauthorized - Please login{}", suffix(.detail))]
    Unauthorized { detail: Option<String> },

    #[error("Forbidden - You do not have permission{}", suffix(.detail))]
    Forbidden { detail: Option<String> },

    #[error("Not Found - Resource does not exist{}", suffix(.detail))]
    NotFound { detail: Option<String> },

    #[error("Internal Server Error{}", suffix(.detail))]
    ServerError { detail: Option<String> },

    /// 502: the backend could not reach the signing provider.
    #[error("Service temporarily unavailable{}", suffix(.detail))]
    Unavailable { detail: Option<String> },

    #[error("Server Error: {status} - {reason}{}", suffix(.detail))]
    Unknown {
        status: u16,
        reason: String,
        detail: Option<String>,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

fn suffix(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(" - {detail}"),
        None => String::new(),
    }
}

impl ApiError {
    /// Normalize a non-2xx response into the taxonomy.
    pub fn from_response(status: u16, body: &str) -> Self {
        let detail = extract_detail(body);
        match status {
            400 => ApiError::BadRequest { detail },
            401 => ApiError::Unauthorized { detail },
            403 => ApiError::Forbidden { detail },
            404 => ApiError::NotFound { detail },
            500 => ApiError::ServerError { detail },
            502 => ApiError::Unavailable { detail },
            _ => ApiError::Unknown {
                status,
                reason: StatusCode::from_u16(status)
                    .ok()
                    .and_then(|code| code.canonical_reason())
                    .unwrap_or("Unknown Status")
                    .to_string(),
                detail,
            },
        }
    }

    /// HTTP status behind this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest { .. } => Some(400),
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::ServerError { .. } => Some(500),
            ApiError::Unavailable { .. } => Some(502),
            ApiError::Unknown { status, .. } => Some(*status),
            ApiError::Transport(_) | ApiError::Serialization(_) | ApiError::Deserialization(_) => None,
        }
    }

    /// Server-supplied detail string, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest { detail }
            | ApiError::Unauthorized { detail }
            | ApiError::Forbidden { detail }
            | ApiError::NotFound { detail }
            | ApiError::ServerError { detail }
            | ApiError::Unavailable { detail }
            | ApiError::Unknown { detail, .. } => detail.as_deref(),
            ApiError::Transport(_) | ApiError::Serialization(_) | ApiError::Deserialization(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Whether replaying the same read could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::ServerError { .. } | ApiError::Unavailable { .. } => true,
            ApiError::Unknown { status, .. } => matches!(status, 408 | 429 | 503 | 504),
            _ => false,
        }
    }
}

/// Pull `detail` out of a JSON error body. Non-JSON bodies carry no detail.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(detail) => Some(detail.clone()),
        other => Some(other.to_string()),
    }
}
