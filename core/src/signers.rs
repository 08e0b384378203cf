//! Read-only view of the `signers/` collection.
//!
//! Signers are created with their document and change status only through
//! the backend's provider poll, so there is nothing here to write.

use std::sync::Arc;

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::transport::Transport;
use crate::types::{DocumentId, Page, Signer, SignerId, SignerStatus};

const SIGNERS: &str = "signers/";

pub struct SignerDirectory<T> {
    gateway: Arc<ApiGateway<T>>,
}

impl<T: Transport> SignerDirectory<T> {
    pub fn new(gateway: Arc<ApiGateway<T>>) -> Self {
        Self { gateway }
    }

    /// Newest first, optionally narrowed to one document and one status.
    pub async fn list(
        &self,
        document: Option<DocumentId>,
        status: Option<SignerStatus>,
    ) -> Result<Page<Signer>, ApiError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(id) = document {
            query.push(("document_id", id.to_string()));
        }
        if let Some(status) = status {
            query.push(("status", status.as_str().to_string()));
        }
        self.gateway.get(SIGNERS, &query).await
    }

    pub async fn get(&self, id: SignerId) -> Result<Signer, ApiError> {
        self.gateway.get(&format!("signers/{id}/"), &[]).await
    }
}
