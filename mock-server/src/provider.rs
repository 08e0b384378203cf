//! In-process stand-in for the third-party signing provider.
//!
//! The provider has its own status vocabulary. The backend maps it into its
//! own through the `From` impls below and never stores provider strings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{DocumentStatus, SignerStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderDocumentStatus {
    Pending,
    Completed,
    Cancelled,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSignerStatus {
    New,
    Signed,
    Refused,
}

impl From<ProviderDocumentStatus> for DocumentStatus {
    fn from(status: ProviderDocumentStatus) -> Self {
        match status {
            ProviderDocumentStatus::Pending => DocumentStatus::Pending,
            ProviderDocumentStatus::Completed => DocumentStatus::Completed,
            ProviderDocumentStatus::Cancelled | ProviderDocumentStatus::Rejected => DocumentStatus::Cancelled,
        }
    }
}

impl From<ProviderSignerStatus> for SignerStatus {
    fn from(status: ProviderSignerStatus) -> Self {
        match status {
            ProviderSignerStatus::New => SignerStatus::Pending,
            ProviderSignerStatus::Signed => SignerStatus::Signed,
            ProviderSignerStatus::Refused => SignerStatus::Cancelled,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("invalid api token")]
    InvalidToken,
}

#[derive(Debug, Clone)]
pub struct ProviderSigner {
    pub token: String,
    pub external_id: String,
    pub status: ProviderSignerStatus,
}

#[derive(Debug, Clone)]
pub struct ProviderDocument {
    pub open_id: i64,
    pub token: String,
    pub external_id: String,
    pub status: ProviderDocumentStatus,
    pub signers: Vec<ProviderSigner>,
}

/// Documents registered with the provider, keyed by provider token.
///
/// Each status poll of a pending document completes it: every signer signs.
#[derive(Debug, Default)]
pub struct SimulatedProvider {
    documents: HashMap<String, ProviderDocument>,
    next_open_id: i64,
}

impl SimulatedProvider {
    /// Register a document. An empty company credential is rejected the way
    /// the real provider rejects a bad token.
    pub fn create(&mut self, api_token: &str, signers: usize) -> Result<ProviderDocument, ProviderError> {
        if api_token.trim().is_empty() {
            return Err(ProviderError::InvalidToken);
        }
        self.next_open_id += 1;
        let document = ProviderDocument {
            open_id: self.next_open_id,
            token: Uuid::new_v4().to_string(),
            external_id: String::new(),
            status: ProviderDocumentStatus::Pending,
            signers: (0..signers)
                .map(|_| ProviderSigner {
                    token: Uuid::new_v4().to_string(),
                    external_id: String::new(),
                    status: ProviderSignerStatus::New,
                })
                .collect(),
        };
        self.documents.insert(document.token.clone(), document.clone());
        Ok(document)
    }

    pub fn poll(&mut self, token: &str) -> Option<ProviderDocument> {
        let document = self.documents.get_mut(token)?;
        if document.status == ProviderDocumentStatus::Pending {
            document.status = ProviderDocumentStatus::Completed;
            for signer in &mut document.signers {
                signer.status = ProviderSignerStatus::Signed;
            }
        }
        Some(document.clone())
    }

    /// Force a provider-side status, as when a signer refuses out of band.
    pub fn set_status(&mut self, token: &str, status: ProviderDocumentStatus) -> bool {
        match self.documents.get_mut(token) {
            Some(document) => {
                document.status = status;
                true
            }
            None => false,
        }
    }
}
