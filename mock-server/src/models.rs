//! Wire types served by the mock backend.

use serde::{Deserialize, Serialize};

pub type CompanyId = u64;
pub type DocumentId = u64;
pub type SignerId = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    #[default]
    PendingApi,
    Pending,
    Completed,
    Cancelled,
    ApiError,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignerStatus {
    #[default]
    Pending,
    Signed,
    Cancelled,
}

impl SignerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignerStatus::Pending => "PENDING",
            SignerStatus::Signed => "SIGNED",
            SignerStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub created_at: String,
    pub last_updated_at: String,
    pub documents_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Signer {
    pub id: SignerId,
    pub token: String,
    pub status: SignerStatus,
    pub name: String,
    pub email: String,
    pub external_id: String,
    pub document: DocumentId,
}

/// Detail representation: company and signers inlined.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub open_id: Option<i64>,
    pub token: String,
    pub name: String,
    pub status: DocumentStatus,
    pub created_at: String,
    pub last_updated_at: String,
    pub created_by: String,
    pub company: Company,
    pub external_id: String,
    pub signers: Vec<Signer>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentListItem {
    pub id: DocumentId,
    pub name: String,
    pub status: DocumentStatus,
    pub created_at: String,
    pub last_updated_at: String,
    pub created_by: String,
    pub company_name: String,
    pub signers_count: usize,
}

/// Response to a partial update: the writable fields plus the timestamp.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentEcho {
    pub id: DocumentId,
    pub name: String,
    pub status: DocumentStatus,
    pub created_by: String,
    pub last_updated_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
}

#[derive(Deserialize)]
pub struct CompanyInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub api_token: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateSigner {
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct CreateDocument {
    pub name: String,
    pub pdf_url: String,
    pub company_id: CompanyId,
    pub created_by: String,
    pub signers: Vec<CreateSigner>,
}

#[derive(Deserialize)]
pub struct UpdateDocument {
    pub name: Option<String>,
    pub status: Option<DocumentStatus>,
    pub created_by: Option<String>,
}
