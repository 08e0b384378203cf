//! Stateless HTTP request builder and response parser for the backend.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and carries no mutable state between
//! calls. Every verb is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`. The
//! gateway executes the round-trip in between.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Synchronous, stateless request builder for one resource namespace.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a resource path onto the base URL with exactly one separator.
    pub fn join(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    pub fn build_get(&self, path: &str, query: &[(&str, String)]) -> Result<HttpRequest, ApiError> {
        let mut url = self.join(path);
        if !query.is_empty() {
            let encoded =
                serde_urlencoded::to_string(query).map_err(|e| ApiError::Serialization(e.to_string()))?;
            url.push('?');
            url.push_str(&encoded);
        }
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: default_headers(),
            body: None,
        })
    }

    /// Build a `POST`, `PUT` or `PATCH` carrying a JSON payload.
    pub fn build_write<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut headers = default_headers();
        headers.push(("content-type".to_string(), "application/json".to_string()));
        Ok(HttpRequest {
            method,
            url: self.join(path),
            headers,
            body: Some(body),
        })
    }

    pub fn build_delete(&self, path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            url: self.join(path),
            headers: default_headers(),
            body: None,
        }
    }

    pub fn parse_json<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub fn parse_empty(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }
}

fn default_headers() -> Vec<(String, String)> {
    vec![("accept".to_string(), "application/json".to_string())]
}

/// Map non-success status codes onto the error taxonomy.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::from_response(response.status, &response.body))
}
