//! Client core for the signdesk document administration backend.
//!
//! # Overview
//! Talks to the backend REST namespace (`documents/`, `companies/`) and keeps
//! a local projection of the document list consistent with it across create,
//! update, status refresh and delete, without reloading after each mutation.
//!
//! # Design
//! - `ApiClient` is stateless: `build_*` produces an `HttpRequest`, `parse_*`
//!   consumes an `HttpResponse`. No I/O.
//! - `Transport` is the I/O seam; `ReqwestTransport` is the production one.
//! - `ApiGateway` exposes get/post/put/patch/delete, normalizes every failure
//!   into `ApiError` and retries transient read failures only.
//! - `DocumentStore` owns the cached list and publishes immutable snapshots
//!   through `tokio::sync::watch`.
//! - `CompanyDirectory` and `SignerDirectory` are uncached pass-throughs over
//!   `companies/` and `signers/`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod companies;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod retry;
pub mod signers;
pub mod store;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use companies::CompanyDirectory;
pub use config::{ApiConfig, ConfigError, ExecutionContext};
pub use error::ApiError;
pub use gateway::ApiGateway;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use retry::RetryConfig;
pub use signers::SignerDirectory;
pub use store::{DocumentSnapshot, DocumentStore};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    Company, CompanyId, CompanyInput, CreateDocument, CreateSigner, DocumentDetail, DocumentEcho,
    DocumentId, DocumentStatus, DocumentSummary, Page, Signer, SignerId, SignerStatus, UpdateDocument,
};
