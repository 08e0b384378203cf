//! Domain DTOs for the signdesk backend.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! the integration tests catch schema drift between the two crates.
//!
//! Response types are lenient: everything except the identifier defaults when
//! absent, and unrecognized status strings land in an `Unknown` variant, so a
//! backend that omits a field or grows its status vocabulary never makes the
//! cached list unloadable.

use serde::{Deserialize, Serialize};

pub type DocumentId = u64;
pub type CompanyId = u64;
pub type SignerId = u64;

/// Backend document status. This is the backend's own vocabulary, not the
/// signing provider's; the backend performs that mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// Stored locally, not yet accepted by the provider.
    #[default]
    PendingApi,
    Pending,
    Completed,
    Cancelled,
    /// The provider rejected the creation call.
    ApiError,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignerStatus {
    #[default]
    Pending,
    Signed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl SignerStatus {
    /// Wire name, as used in the `status` query filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignerStatus::Pending => "PENDING",
            SignerStatus::Signed => "SIGNED",
            SignerStatus::Cancelled => "CANCELLED",
            SignerStatus::Unknown => "UNKNOWN",
        }
    }
}

/// A row of the document list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_updated_at: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub signers_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_updated_at: String,
    #[serde(default)]
    pub documents_count: usize,
}

/// Payload for creating or replacing a company. The provider credential is
/// write-only: the backend never echoes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub id: SignerId,
    /// Token assigned by the signing provider.
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub status: SignerStatus,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub document: Option<DocumentId>,
}

/// Full document as returned by `GET documents/{id}/` and `POST documents/`.
/// Fetched on demand; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDetail {
    pub id: DocumentId,
    #[serde(default)]
    pub open_id: Option<i64>,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_updated_at: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub company: Option<Company>,
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub signers: Vec<Signer>,
}

impl DocumentDetail {
    /// Project down to the list representation.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            name: self.name.clone(),
            status: self.status,
            created_at: self.created_at.clone(),
            last_updated_at: self.last_updated_at.clone(),
            created_by: self.created_by.clone(),
            company_name: self
                .company
                .as_ref()
                .map(|company| company.name.clone())
                .unwrap_or_default(),
            signers_count: self.signers.len(),
        }
    }
}

/// The server's echo of a document mutation. Only the fields it sends are
/// `Some`; merging into the cache touches nothing else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEcho {
    #[serde(default)]
    pub id: Option<DocumentId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub last_updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSigner {
    pub name: String,
    pub email: String,
}

/// Request payload for `POST documents/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDocument {
    pub name: String,
    pub pdf_url: String,
    pub company_id: CompanyId,
    pub created_by: String,
    pub signers: Vec<CreateSigner>,
}

/// Request payload for `PATCH documents/{id}/`. Only the fields present in the
/// JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DocumentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// Paginated list envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}
