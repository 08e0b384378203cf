//! In-memory backend state and the rules the real backend enforces.

use std::collections::{BTreeMap, HashSet};

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::error::BackendError;
use crate::models::{
    Company, CompanyId, CompanyInput, CreateDocument, Document, DocumentEcho, DocumentId, DocumentListItem,
    DocumentStatus, Signer, SignerId, SignerStatus, UpdateDocument,
};
use crate::provider::SimulatedProvider;

struct CompanyRecord {
    id: CompanyId,
    name: String,
    api_token: String,
    created_at: String,
    last_updated_at: String,
}

struct SignerRecord {
    id: SignerId,
    token: String,
    status: SignerStatus,
    name: String,
    email: String,
    external_id: String,
}

struct DocumentRecord {
    id: DocumentId,
    open_id: Option<i64>,
    token: String,
    name: String,
    status: DocumentStatus,
    created_at: String,
    last_updated_at: String,
    created_by: String,
    company_id: CompanyId,
    external_id: String,
    signers: Vec<SignerRecord>,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Default)]
pub struct Backend {
    companies: BTreeMap<CompanyId, CompanyRecord>,
    documents: BTreeMap<DocumentId, DocumentRecord>,
    last_company_id: CompanyId,
    last_document_id: DocumentId,
    last_signer_id: SignerId,
    provider: SimulatedProvider,
}

impl Backend {
    /// A backend holding one company with a usable provider credential.
    pub fn seeded() -> Self {
        let mut backend = Self::default();
        // Cannot fail: the name is non-empty.
        let _ = backend.create_company(CompanyInput {
            name: "Demo Company".to_string(),
            api_token: Some("demo-token".to_string()),
        });
        backend
    }

    pub fn provider_mut(&mut self) -> &mut SimulatedProvider {
        &mut self.provider
    }

    // --- companies ---

    fn company_view(&self, company: &CompanyRecord) -> Company {
        Company {
            id: company.id,
            name: company.name.clone(),
            created_at: company.created_at.clone(),
            last_updated_at: company.last_updated_at.clone(),
            documents_count: self
                .documents
                .values()
                .filter(|doc| doc.company_id == company.id)
                .count(),
        }
    }

    /// Newest first. Ids are issued in creation order.
    pub fn list_companies(&self) -> Vec<Company> {
        self.companies.values().rev().map(|c| self.company_view(c)).collect()
    }

    pub fn company(&self, id: CompanyId) -> Result<Company, BackendError> {
        let company = self.companies.get(&id).ok_or(BackendError::NotFound)?;
        Ok(self.company_view(company))
    }

    pub fn create_company(&mut self, input: CompanyInput) -> Result<Company, BackendError> {
        let name = validate_company_name(&input.name)?;
        self.last_company_id += 1;
        let stamp = now();
        let company = CompanyRecord {
            id: self.last_company_id,
            name,
            api_token: input.api_token.unwrap_or_default(),
            created_at: stamp.clone(),
            last_updated_at: stamp,
        };
        let view = self.company_view(&company);
        self.companies.insert(company.id, company);
        Ok(view)
    }

    /// Full replacement; an omitted `api_token` keeps the stored one.
    pub fn replace_company(&mut self, id: CompanyId, input: CompanyInput) -> Result<Company, BackendError> {
        let name = validate_company_name(&input.name)?;
        let company = self.companies.get_mut(&id).ok_or(BackendError::NotFound)?;
        company.name = name;
        if let Some(token) = input.api_token {
            company.api_token = token;
        }
        company.last_updated_at = now();
        self.company(id)
    }

    /// Deletes the company's documents with it.
    pub fn delete_company(&mut self, id: CompanyId) -> Result<(), BackendError> {
        self.companies.remove(&id).ok_or(BackendError::NotFound)?;
        self.documents.retain(|_, doc| doc.company_id != id);
        Ok(())
    }

    // --- documents ---

    fn company_name(&self, id: CompanyId) -> String {
        self.companies.get(&id).map(|c| c.name.clone()).unwrap_or_default()
    }

    fn document_view(&self, doc: &DocumentRecord) -> Result<Document, BackendError> {
        let company = self.companies.get(&doc.company_id).ok_or(BackendError::NotFound)?;
        Ok(Document {
            id: doc.id,
            open_id: doc.open_id,
            token: doc.token.clone(),
            name: doc.name.clone(),
            status: doc.status,
            created_at: doc.created_at.clone(),
            last_updated_at: doc.last_updated_at.clone(),
            created_by: doc.created_by.clone(),
            company: self.company_view(company),
            external_id: doc.external_id.clone(),
            signers: doc.signers.iter().map(|s| signer_view(doc.id, s)).collect(),
        })
    }

    /// Newest first, optionally restricted to one company.
    pub fn list_documents(&self, company: Option<CompanyId>) -> Vec<DocumentListItem> {
        self.documents
            .values()
            .rev()
            .filter(|doc| company.map_or(true, |id| doc.company_id == id))
            .map(|doc| DocumentListItem {
                id: doc.id,
                name: doc.name.clone(),
                status: doc.status,
                created_at: doc.created_at.clone(),
                last_updated_at: doc.last_updated_at.clone(),
                created_by: doc.created_by.clone(),
                company_name: self.company_name(doc.company_id),
                signers_count: doc.signers.len(),
            })
            .collect()
    }

    pub fn document(&self, id: DocumentId) -> Result<Document, BackendError> {
        let doc = self.documents.get(&id).ok_or(BackendError::NotFound)?;
        self.document_view(doc)
    }

    /// Validate, register with the provider, then store. A provider failure
    /// stores nothing.
    pub fn create_document(&mut self, input: CreateDocument) -> Result<Document, BackendError> {
        let name = input.name.trim().to_string();
        if name.chars().count() < 3 {
            return Err(BackendError::Validation(
                "Document name must be at least 3 characters long".to_string(),
            ));
        }
        let pdf_url = input.pdf_url.trim();
        if !(pdf_url.starts_with("http://") || pdf_url.starts_with("https://")) {
            return Err(BackendError::Validation("Enter a valid URL.".to_string()));
        }
        if !pdf_url.to_lowercase().ends_with(".pdf") {
            return Err(BackendError::Validation("URL must point to a PDF file".to_string()));
        }
        let api_token = match self.companies.get(&input.company_id) {
            Some(company) => company.api_token.clone(),
            None => {
                return Err(BackendError::Validation(format!(
                    "Company with ID {} does not exist",
                    input.company_id
                )))
            }
        };
        if input.signers.is_empty() {
            return Err(BackendError::Validation("At least one signer is required".to_string()));
        }
        let mut emails = HashSet::new();
        for signer in &input.signers {
            if signer.name.trim().is_empty() {
                return Err(BackendError::Validation("Signer name may not be blank".to_string()));
            }
            if !signer.email.contains('@') {
                return Err(BackendError::Validation("Enter a valid email address.".to_string()));
            }
            if !emails.insert(signer.email.trim().to_lowercase()) {
                return Err(BackendError::Validation(
                    "Duplicate email addresses are not allowed".to_string(),
                ));
            }
        }

        let registered = self
            .provider
            .create(&api_token, input.signers.len())
            .map_err(|e| {
                warn!(company_id = input.company_id, error = %e, "provider rejected document");
                BackendError::Provider(e.to_string())
            })?;

        self.last_document_id += 1;
        let id = self.last_document_id;
        let stamp = now();
        let mut signers = Vec::with_capacity(input.signers.len());
        for (signer, remote) in input.signers.into_iter().zip(registered.signers) {
            self.last_signer_id += 1;
            signers.push(SignerRecord {
                id: self.last_signer_id,
                token: remote.token,
                status: remote.status.into(),
                name: signer.name.trim().to_string(),
                email: signer.email.trim().to_lowercase(),
                external_id: remote.external_id,
            });
        }
        let doc = DocumentRecord {
            id,
            open_id: Some(registered.open_id),
            token: registered.token,
            name,
            status: registered.status.into(),
            created_at: stamp.clone(),
            last_updated_at: stamp,
            created_by: input.created_by,
            company_id: input.company_id,
            external_id: registered.external_id,
            signers,
        };
        self.documents.insert(id, doc);
        info!(document_id = id, "document created");
        self.document(id)
    }

    /// Local-only update. A completed document keeps its status.
    pub fn update_document(&mut self, id: DocumentId, input: UpdateDocument) -> Result<DocumentEcho, BackendError> {
        let doc = self.documents.get_mut(&id).ok_or(BackendError::NotFound)?;
        if let Some(status) = input.status {
            if doc.status == DocumentStatus::Completed && status != DocumentStatus::Completed {
                return Err(BackendError::Validation(
                    "Cannot change status of completed document".to_string(),
                ));
            }
        }
        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(BackendError::Validation("Document name may not be blank".to_string()));
            }
        }

        if let Some(name) = input.name {
            doc.name = name;
        }
        if let Some(status) = input.status {
            doc.status = status;
        }
        if let Some(created_by) = input.created_by {
            doc.created_by = created_by;
        }
        doc.last_updated_at = now();

        Ok(DocumentEcho {
            id: doc.id,
            name: doc.name.clone(),
            status: doc.status,
            created_by: doc.created_by.clone(),
            last_updated_at: doc.last_updated_at.clone(),
        })
    }

    /// Poll the provider and fold its answer into the stored document.
    pub fn refresh_status(&mut self, id: DocumentId) -> Result<Document, BackendError> {
        let doc = self.documents.get_mut(&id).ok_or(BackendError::NotFound)?;
        if doc.token.is_empty() {
            warn!(document_id = id, "document has no provider token");
            return self.document(id);
        }

        if let Some(remote) = self.provider.poll(&doc.token) {
            let status = DocumentStatus::from(remote.status);
            let mut changed = status != doc.status;
            doc.status = status;
            for signer in &mut doc.signers {
                if let Some(theirs) = remote.signers.iter().find(|s| s.token == signer.token) {
                    let status = SignerStatus::from(theirs.status);
                    changed |= status != signer.status;
                    signer.status = status;
                }
            }
            if changed {
                doc.last_updated_at = now();
                info!(document_id = id, status = ?doc.status, "document status updated");
            }
        }
        self.document(id)
    }

    // --- signers ---

    /// Newest first. `status` matches the backend vocabulary case-insensitively;
    /// an unknown status name matches nothing.
    pub fn list_signers(&self, document: Option<DocumentId>, status: Option<&str>) -> Vec<Signer> {
        let status = status.map(str::to_uppercase);
        let mut signers: Vec<Signer> = self
            .documents
            .values()
            .filter(|doc| document.map_or(true, |id| doc.id == id))
            .flat_map(|doc| doc.signers.iter().map(move |s| signer_view(doc.id, s)))
            .filter(|s| status.as_deref().map_or(true, |wanted| s.status.as_str() == wanted))
            .collect();
        signers.sort_by(|a, b| b.id.cmp(&a.id));
        signers
    }

    pub fn signer(&self, id: SignerId) -> Result<Signer, BackendError> {
        self.documents
            .values()
            .find_map(|doc| doc.signers.iter().find(|s| s.id == id).map(|s| signer_view(doc.id, s)))
            .ok_or(BackendError::NotFound)
    }

    pub fn delete_document(&mut self, id: DocumentId) -> Result<(), BackendError> {
        let doc = self.documents.remove(&id).ok_or(BackendError::NotFound)?;
        info!(document_id = id, name = %doc.name, "document deleted");
        Ok(())
    }

    pub fn provider_token(&self, id: DocumentId) -> Option<String> {
        self.documents.get(&id).map(|doc| doc.token.clone())
    }
}

fn signer_view(document: DocumentId, signer: &SignerRecord) -> Signer {
    Signer {
        id: signer.id,
        token: signer.token.clone(),
        status: signer.status,
        name: signer.name.clone(),
        email: signer.email.clone(),
        external_id: signer.external_id.clone(),
        document,
    }
}

fn validate_company_name(name: &str) -> Result<String, BackendError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BackendError::Validation("Company name may not be blank".to_string()));
    }
    Ok(name.to_string())
}
