//! Scripted transport shared by the store tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use signdesk_core::{
    ApiClient, ApiError, ApiGateway, DocumentStore, HttpRequest, HttpResponse, RetryConfig, Transport,
};

pub const BASE_URL: &str = "http://backend.test/api";

/// Answers requests from a FIFO script, in call order, and records them.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
    sent: Mutex<Vec<HttpRequest>>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedTransport {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn respond(&self, status: u16, body: serde_json::Value) {
        let body = if body.is_null() { String::new() } else { body.to_string() };
        self.script.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        }));
    }

    pub fn fail(&self, err: ApiError) {
        self.script.lock().unwrap().push_back(Err(err));
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }

    /// Highest number of requests that were in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.sent.lock().unwrap().push(request.clone());
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted request: {} {}", request.method.as_str(), request.url));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

pub fn store_with(transport: ScriptedTransport) -> DocumentStore<ScriptedTransport> {
    let gateway = ApiGateway::new(ApiClient::new(BASE_URL), transport).with_retry(RetryConfig {
        initial_backoff: Duration::ZERO,
        ..RetryConfig::default()
    });
    DocumentStore::new(Arc::new(gateway))
}

pub fn store() -> DocumentStore<ScriptedTransport> {
    store_with(ScriptedTransport::default())
}

pub fn page(results: serde_json::Value) -> serde_json::Value {
    let count = results.as_array().map(Vec::len).unwrap_or_default();
    serde_json::json!({ "results": results, "count": count, "next": null, "previous": null })
}
