//! Uncached pass-through over the `companies/` collection.

use std::sync::Arc;

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::transport::Transport;
use crate::types::{Company, CompanyId, CompanyInput, Page};

const COMPANIES: &str = "companies/";

fn company_path(id: CompanyId) -> String {
    format!("companies/{id}/")
}

pub struct CompanyDirectory<T> {
    gateway: Arc<ApiGateway<T>>,
}

impl<T: Transport> CompanyDirectory<T> {
    /// Shares the gateway (and its transport) with a `DocumentStore`.
    pub fn new(gateway: Arc<ApiGateway<T>>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Page<Company>, ApiError> {
        self.gateway.get(COMPANIES, &[]).await
    }

    pub async fn get(&self, id: CompanyId) -> Result<Company, ApiError> {
        self.gateway.get(&company_path(id), &[]).await
    }

    pub async fn create(&self, input: &CompanyInput) -> Result<Company, ApiError> {
        self.gateway.post(COMPANIES, input).await
    }

    /// Full replacement (`PUT`).
    pub async fn update(&self, id: CompanyId, input: &CompanyInput) -> Result<Company, ApiError> {
        self.gateway.put(&company_path(id), input).await
    }

    /// Deleting a company also deletes its documents at the backend; callers
    /// holding a `DocumentStore` should reload it afterwards.
    pub async fn delete(&self, id: CompanyId) -> Result<(), ApiError> {
        self.gateway.delete(&company_path(id)).await
    }
}
