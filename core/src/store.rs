//! In-memory document list kept consistent with the backend.
//!
//! # Design
//! `DocumentStore` is the only owner of the cached list. The list lives inside
//! a `watch` channel as an immutable `Arc<Vec<_>>` snapshot; observers hold
//! receivers and never get mutable access. Every successful mutation publishes
//! its new snapshot before the call returns, so a read right after a write sees
//! the write without another round-trip. A failed call publishes nothing.
//!
//! Mutations addressed to one document id (`update`, `refresh_status`,
//! `delete`) are serialized by a per-id lock held across the network call and
//! the cache write. `list` and `create` are not ordered against them: when a
//! reload and a mutation overlap, whichever completion runs last decides the
//! cached state.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tokio::sync::{watch, Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    Company, CompanyId, CreateDocument, DocumentDetail, DocumentEcho, DocumentId, DocumentStatus,
    DocumentSummary, Page, UpdateDocument,
};

const DOCUMENTS: &str = "documents/";
const COMPANIES: &str = "companies/";

fn document_path(id: DocumentId) -> String {
    format!("documents/{id}/")
}

fn status_path(id: DocumentId) -> String {
    format!("documents/{id}/update_status/")
}

/// Immutable view of the cached list, newest first.
pub type DocumentSnapshot = Arc<Vec<DocumentSummary>>;

pub struct DocumentStore<T> {
    gateway: Arc<ApiGateway<T>>,
    documents: watch::Sender<DocumentSnapshot>,
    loading: Loading,
    locks: DashMap<DocumentId, Arc<AsyncMutex<()>>>,
}

impl DocumentStore<ReqwestTransport> {
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self::new(Arc::new(ApiGateway::from_config(config)?)))
    }
}

impl<T: Transport> DocumentStore<T> {
    pub fn new(gateway: Arc<ApiGateway<T>>) -> Self {
        let (documents, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            gateway,
            documents,
            loading: Loading::new(),
            locks: DashMap::new(),
        }
    }

    pub fn gateway(&self) -> &Arc<ApiGateway<T>> {
        &self.gateway
    }

    /// Authoritative reload: the cached list is replaced, never merged.
    pub async fn list(&self, company: Option<CompanyId>) -> Result<Page<DocumentSummary>, ApiError> {
        let _loading = self.loading.begin();
        let query: Vec<(&str, String)> = company
            .map(|id| ("company_id", id.to_string()))
            .into_iter()
            .collect();
        let page: Page<DocumentSummary> = self.gateway.get(DOCUMENTS, &query).await?;

        let mut seen = HashSet::new();
        let documents: Vec<DocumentSummary> = page
            .results
            .iter()
            .filter(|doc| seen.insert(doc.id))
            .cloned()
            .collect();
        debug!(len = documents.len(), "document list replaced");
        self.documents.send_replace(Arc::new(documents));
        Ok(page)
    }

    /// Reload the unfiltered list, discarding the page.
    pub async fn reload(&self) -> Result<(), ApiError> {
        self.list(None).await.map(|_| ())
    }

    /// Create at the backend and prepend the projection to the cache.
    pub async fn create(&self, input: &CreateDocument) -> Result<DocumentDetail, ApiError> {
        let _loading = self.loading.begin();
        let created: DocumentDetail = self.gateway.post(DOCUMENTS, input).await?;

        let summary = created.summary();
        self.documents.send_modify(|docs| {
            let mut next = Vec::with_capacity(docs.len() + 1);
            next.push(summary);
            next.extend(docs.iter().filter(|doc| doc.id != created.id).cloned());
            *docs = Arc::new(next);
        });
        info!(document_id = created.id, status = ?created.status, "document created");
        Ok(created)
    }

    /// `PATCH` and merge the echoed name, status and timestamp.
    pub async fn update(&self, id: DocumentId, fields: &UpdateDocument) -> Result<DocumentEcho, ApiError> {
        let _lock = self.lock_document(id).await;

        let echo: DocumentEcho = self.gateway.patch(&document_path(id), fields).await?;
        self.merge(id, |doc| apply_update(doc, &echo));
        Ok(echo)
    }

    /// Ask the backend to poll the signing provider, then merge the status.
    pub async fn refresh_status(&self, id: DocumentId) -> Result<DocumentEcho, ApiError> {
        let _lock = self.lock_document(id).await;

        let echo: DocumentEcho = self.gateway.post(&status_path(id), &serde_json::json!({})).await?;
        self.merge(id, |doc| apply_status(doc, &echo));
        Ok(echo)
    }

    pub async fn delete(&self, id: DocumentId) -> Result<(), ApiError> {
        let _lock = self.lock_document(id).await;

        self.gateway.delete(&document_path(id)).await?;
        let removed = self.documents.send_if_modified(|docs| {
            if !docs.iter().any(|doc| doc.id == id) {
                return false;
            }
            Arc::make_mut(docs).retain(|doc| doc.id != id);
            true
        });
        info!(document_id = id, removed, "document deleted");
        Ok(())
    }

    /// Full document with company and signers, straight from the backend.
    pub async fn detail(&self, id: DocumentId) -> Result<DocumentDetail, ApiError> {
        self.gateway.get(&document_path(id), &[]).await
    }

    /// Companies for the document creation form. Not cached.
    pub async fn list_companies(&self) -> Result<Page<Company>, ApiError> {
        self.gateway.get(COMPANIES, &[]).await
    }

    pub fn clear(&self) {
        self.documents.send_replace(Arc::new(Vec::new()));
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.documents.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DocumentSnapshot> {
        self.documents.subscribe()
    }

    pub fn get(&self, id: DocumentId) -> Option<DocumentSummary> {
        self.documents.borrow().iter().find(|doc| doc.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.borrow().is_empty()
    }

    pub fn with_status(&self, status: DocumentStatus) -> Vec<DocumentSummary> {
        self.documents
            .borrow()
            .iter()
            .filter(|doc| doc.status == status)
            .cloned()
            .collect()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.tx.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.tx.subscribe()
    }

    async fn lock_document(&self, id: DocumentId) -> DocumentLock<'_> {
        let lock = self.locks.entry(id).or_default().value().clone();
        DocumentLock {
            locks: &self.locks,
            id,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Apply `f` to the cached entry for `id`. Absent ids are left absent.
    fn merge(&self, id: DocumentId, f: impl FnOnce(&mut DocumentSummary)) {
        let changed = self.documents.send_if_modified(|docs| {
            let Some(index) = docs.iter().position(|doc| doc.id == id) else {
                return false;
            };
            let mut entry = docs[index].clone();
            f(&mut entry);
            if entry == docs[index] {
                return false;
            }
            Arc::make_mut(docs)[index] = entry;
            true
        });
        debug!(document_id = id, changed, "merged server echo");
    }
}

fn apply_update(doc: &mut DocumentSummary, echo: &DocumentEcho) {
    if let Some(name) = &echo.name {
        doc.name = name.clone();
    }
    apply_status(doc, echo);
}

fn apply_status(doc: &mut DocumentSummary, echo: &DocumentEcho) {
    if let Some(status) = echo.status {
        doc.status = status;
    }
    if let Some(last_updated_at) = &echo.last_updated_at {
        doc.last_updated_at = last_updated_at.clone();
    }
}

/// Holds the per-id lock. Dropping it unlocks and evicts the entry unless
/// another call is already queued on the same id, whether the call finished,
/// failed or was cancelled.
struct DocumentLock<'a> {
    locks: &'a DashMap<DocumentId, Arc<AsyncMutex<()>>>,
    id: DocumentId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for DocumentLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Loading flag shared by overlapping `list` and `create` calls. It stays on
/// until the last of them finishes, successfully or not.
struct Loading {
    in_flight: Mutex<usize>,
    tx: watch::Sender<bool>,
}

impl Loading {
    fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            in_flight: Mutex::new(0),
            tx,
        }
    }

    fn begin(&self) -> LoadingGuard<'_> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight += 1;
        self.tx.send_replace(true);
        LoadingGuard { loading: self }
    }
}

struct LoadingGuard<'a> {
    loading: &'a Loading,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self
            .loading
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *in_flight -= 1;
        if *in_flight == 0 {
            self.loading.tx.send_replace(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::client::ApiClient;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::retry::RetryConfig;

    /// Answers from a queue; once the queue is empty requests never complete.
    #[derive(Default)]
    struct Queue {
        replies: Mutex<VecDeque<HttpResponse>>,
    }

    impl Queue {
        fn push(&self, status: u16, body: &str) {
            self.replies.lock().unwrap().push_back(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            });
        }
    }

    #[async_trait]
    impl Transport for Queue {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
            let reply = self.replies.lock().unwrap().pop_front();
            match reply {
                Some(reply) => Ok(reply),
                None => std::future::pending().await,
            }
        }
    }

    fn queued_store() -> DocumentStore<Queue> {
        let gateway = ApiGateway::new(ApiClient::new("http://backend.test/api"), Queue::default()).with_retry(
            RetryConfig {
                max_retries: 0,
                ..RetryConfig::default()
            },
        );
        DocumentStore::new(Arc::new(gateway))
    }

    fn summary() -> DocumentSummary {
        DocumentSummary {
            id: 1,
            name: "Lease".to_string(),
            status: DocumentStatus::Pending,
            created_at: "T0".to_string(),
            last_updated_at: "T1".to_string(),
            created_by: "ops".to_string(),
            company_name: "Acme".to_string(),
            signers_count: 2,
        }
    }

    #[test]
    fn update_merge_touches_only_echoed_fields() {
        let mut doc = summary();
        let echo = DocumentEcho {
            name: Some("Lease v2".to_string()),
            created_by: Some("someone else".to_string()),
            ..Default::default()
        };
        apply_update(&mut doc, &echo);
        assert_eq!(doc.name, "Lease v2");
        assert_eq!(doc.created_by, "ops");
        assert_eq!(doc.status, DocumentStatus::Pending);
        assert_eq!(doc.last_updated_at, "T1");
    }

    #[test]
    fn status_merge_ignores_name() {
        let mut doc = summary();
        let echo = DocumentEcho {
            name: Some("ignored".to_string()),
            status: Some(DocumentStatus::Completed),
            last_updated_at: Some("T2".to_string()),
            ..Default::default()
        };
        apply_status(&mut doc, &echo);
        assert_eq!(doc.name, "Lease");
        assert_eq!(doc.status, DocumentStatus::Completed);
        assert_eq!(doc.last_updated_at, "T2");
    }

    #[test]
    fn loading_stays_on_until_last_guard_drops() {
        let loading = Loading::new();
        let first = loading.begin();
        let second = loading.begin();
        assert!(*loading.tx.borrow());
        drop(first);
        assert!(*loading.tx.borrow());
        drop(second);
        assert!(!*loading.tx.borrow());
    }

    #[tokio::test]
    async fn document_locks_are_released_after_success_and_failure() {
        let store = queued_store();
        let queue = store.gateway().transport();
        queue.push(200, r#"{"id":1,"name":"Lease v2"}"#);
        queue.push(404, r#"{"detail":"Not found."}"#);
        queue.push(200, r#"{"id":2,"status":"COMPLETED","last_updated_at":"T2"}"#);
        queue.push(502, r#"{"detail":"provider down"}"#);
        queue.push(204, "");
        queue.push(404, "");

        let rename = UpdateDocument {
            name: Some("Lease v2".to_string()),
            ..Default::default()
        };
        store.update(1, &rename).await.unwrap();
        store.update(9, &rename).await.unwrap_err();
        store.refresh_status(2).await.unwrap();
        store.refresh_status(3).await.unwrap_err();
        store.delete(1).await.unwrap();
        store.delete(1).await.unwrap_err();

        assert!(store.locks.is_empty());
    }

    #[tokio::test]
    async fn refreshing_many_ids_leaves_no_locks_behind() {
        let store = queued_store();
        for id in 0..200 {
            store
                .gateway()
                .transport()
                .push(200, &format!(r#"{{"id":{id},"status":"PENDING"}}"#));
            store.refresh_status(id).await.unwrap();
        }
        store.clear();
        assert!(store.locks.is_empty());
    }

    #[tokio::test]
    async fn cancelled_call_releases_its_lock() {
        let store = queued_store();
        let stalled = tokio::time::timeout(Duration::from_millis(20), store.refresh_status(5)).await;
        assert!(stalled.is_err());
        assert!(store.locks.is_empty());
    }
}
