//! Five-verb adapter over the backend namespace.
//!
//! # Design
//! `ApiGateway` composes the three stateless pieces: `ApiClient` builds and
//! parses, a `Transport` performs the round-trip, and `RetryConfig` decides
//! whether a failed read is replayed. Writes are sent exactly once so a flaky
//! connection cannot create the same document at the provider twice.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::client::ApiClient;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::retry::{retry_read, RetryConfig};
use crate::transport::{ReqwestTransport, Transport};

pub struct ApiGateway<T> {
    client: ApiClient,
    transport: T,
    retry: RetryConfig,
}

impl ApiGateway<ReqwestTransport> {
    /// Wire a reqwest-backed gateway from startup configuration.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let transport = match config.request_timeout() {
            Some(timeout) => ReqwestTransport::with_timeout(timeout)?,
            None => ReqwestTransport::new(),
        };
        Ok(Self::new(ApiClient::new(config.base_url()), transport).with_retry(config.read_retry()))
    }
}

impl<T: Transport> ApiGateway<T> {
    pub fn new(client: ApiClient, transport: T) -> Self {
        Self {
            client,
            transport,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `GET`, replayed on transient failure.
    pub async fn get<R: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<R, ApiError> {
        let request = self.client.build_get(path, query)?;
        let pending = &request;
        let result = retry_read(&self.retry, path, || async move {
            let response = self.send(pending.clone()).await?;
            self.client.parse_json(response)
        })
        .await;
        log_failure(HttpMethod::Get, &request.url, result)
    }

    pub async fn post<B, R>(&self, path: &str, payload: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.write(HttpMethod::Post, path, payload).await
    }

    pub async fn put<B, R>(&self, path: &str, payload: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.write(HttpMethod::Put, path, payload).await
    }

    pub async fn patch<B, R>(&self, path: &str, payload: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.write(HttpMethod::Patch, path, payload).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.client.build_delete(path);
        let url = request.url.clone();
        let result = match self.send(request).await {
            Ok(response) => self.client.parse_empty(response),
            Err(err) => Err(err),
        };
        log_failure(HttpMethod::Delete, &url, result)
    }

    async fn write<B, R>(&self, method: HttpMethod, path: &str, payload: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.client.build_write(method, path, payload)?;
        let url = request.url.clone();
        let result = match self.send(request).await {
            Ok(response) => self.client.parse_json(response),
            Err(err) => Err(err),
        };
        log_failure(method, &url, result)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = self.transport.execute(request).await?;
        debug!(status = response.status, "received response");
        Ok(response)
    }
}

fn log_failure<R>(method: HttpMethod, url: &str, result: Result<R, ApiError>) -> Result<R, ApiError> {
    if let Err(err) = &result {
        error!(
            method = method.as_str(),
            url,
            status = err.status(),
            error = %err,
            "API request failed"
        );
    }
    result
}
