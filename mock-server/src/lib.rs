//! Local stand-in for the signing backend, served with axum.

mod backend;
mod error;
pub mod models;
pub mod provider;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub use backend::Backend;
pub use error::BackendError;
use models::{
    Company, CompanyId, CompanyInput, CreateDocument, Document, DocumentEcho, DocumentId, DocumentListItem,
    Page, Signer, SignerId, UpdateDocument,
};

pub const PAGE_SIZE: usize = 20;

pub type Db = Arc<RwLock<Backend>>;

/// Router over a seeded backend.
pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(Backend::seeded())))
}

/// Router over caller-owned state, so tests can reach the provider.
pub fn app_with(db: Db) -> Router {
    let api = Router::new()
        .route("/companies/", get(list_companies).post(create_company))
        .route(
            "/companies/{id}/",
            get(get_company).put(replace_company).delete(delete_company),
        )
        .route("/documents/", get(list_documents).post(create_document))
        .route(
            "/documents/{id}/",
            get(get_document)
                .patch(update_document)
                .put(update_document)
                .delete(delete_document),
        )
        .route("/documents/{id}/update_status/", post(update_status))
        .route("/signers/", get(list_signers))
        .route("/signers/{id}/", get(get_signer))
        .with_state(db);
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, Arc::new(RwLock::new(Backend::seeded()))).await
}

pub async fn serve(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(db)).await
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<String>,
}

#[derive(Deserialize)]
struct DocumentQuery {
    company_id: Option<String>,
    page: Option<String>,
}

#[derive(Deserialize)]
struct SignerQuery {
    document_id: Option<String>,
    status: Option<String>,
    page: Option<String>,
}

/// Blank means absent; anything else must be a number.
fn numeric_filter(raw: Option<&str>, name: &'static str) -> Result<Option<u64>, BackendError> {
    match raw {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| BackendError::InvalidFilter(name)),
    }
}

/// Slice `items` into the requested 1-based page. Links are path-relative.
fn paginate<T: Serialize>(
    items: Vec<T>,
    page: Option<&str>,
    path: &str,
    extra: &[(&str, String)],
) -> Result<Page<T>, BackendError> {
    let page = match page {
        None | Some("") => 1,
        Some(raw) => raw.parse::<usize>().map_err(|_| BackendError::InvalidPage)?,
    };
    let count = items.len();
    let pages = count.div_ceil(PAGE_SIZE).max(1);
    if page == 0 || page > pages {
        return Err(BackendError::InvalidPage);
    }

    let link = |n: usize| {
        let mut query: Vec<String> = extra.iter().map(|(k, v)| format!("{k}={v}")).collect();
        if n > 1 {
            query.push(format!("page={n}"));
        }
        if query.is_empty() {
            format!("/api/{path}")
        } else {
            format!("/api/{path}?{}", query.join("&"))
        }
    };

    Ok(Page {
        results: items.into_iter().skip((page - 1) * PAGE_SIZE).take(PAGE_SIZE).collect(),
        count,
        next: (page < pages).then(|| link(page + 1)),
        previous: (page > 1).then(|| link(page - 1)),
    })
}

async fn list_companies(
    State(db): State<Db>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Company>>, BackendError> {
    let companies = db.read().await.list_companies();
    paginate(companies, query.page.as_deref(), "companies/", &[]).map(Json)
}

async fn create_company(
    State(db): State<Db>,
    Json(input): Json<CompanyInput>,
) -> Result<(StatusCode, Json<Company>), BackendError> {
    let company = db.write().await.create_company(input)?;
    info!(company_id = company.id, "company created");
    Ok((StatusCode::CREATED, Json(company)))
}

async fn get_company(State(db): State<Db>, Path(id): Path<CompanyId>) -> Result<Json<Company>, BackendError> {
    db.read().await.company(id).map(Json)
}

async fn replace_company(
    State(db): State<Db>,
    Path(id): Path<CompanyId>,
    Json(input): Json<CompanyInput>,
) -> Result<Json<Company>, BackendError> {
    db.write().await.replace_company(id, input).map(Json)
}

async fn delete_company(State(db): State<Db>, Path(id): Path<CompanyId>) -> Result<StatusCode, BackendError> {
    db.write().await.delete_company(id)?;
    info!(company_id = id, "company deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_documents(
    State(db): State<Db>,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<Page<DocumentListItem>>, BackendError> {
    let company = numeric_filter(query.company_id.as_deref(), "company_id")?;
    let documents = db.read().await.list_documents(company);
    let extra: Vec<(&str, String)> = company.map(|id| ("company_id", id.to_string())).into_iter().collect();
    paginate(documents, query.page.as_deref(), "documents/", &extra).map(Json)
}

async fn create_document(
    State(db): State<Db>,
    Json(input): Json<CreateDocument>,
) -> Result<(StatusCode, Json<Document>), BackendError> {
    let document = db.write().await.create_document(input)?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn get_document(State(db): State<Db>, Path(id): Path<DocumentId>) -> Result<Json<Document>, BackendError> {
    db.read().await.document(id).map(Json)
}

async fn update_document(
    State(db): State<Db>,
    Path(id): Path<DocumentId>,
    Json(input): Json<UpdateDocument>,
) -> Result<Json<DocumentEcho>, BackendError> {
    db.write().await.update_document(id, input).map(Json)
}

async fn update_status(State(db): State<Db>, Path(id): Path<DocumentId>) -> Result<Json<Document>, BackendError> {
    db.write().await.refresh_status(id).map(Json)
}

async fn list_signers(
    State(db): State<Db>,
    Query(query): Query<SignerQuery>,
) -> Result<Json<Page<Signer>>, BackendError> {
    let document = numeric_filter(query.document_id.as_deref(), "document_id")?;
    let status = query.status.as_deref().filter(|s| !s.is_empty());
    let signers = db.read().await.list_signers(document, status);

    let mut extra: Vec<(&str, String)> = Vec::new();
    if let Some(id) = document {
        extra.push(("document_id", id.to_string()));
    }
    if let Some(status) = status {
        extra.push(("status", status.to_string()));
    }
    paginate(signers, query.page.as_deref(), "signers/", &extra).map(Json)
}

async fn get_signer(State(db): State<Db>, Path(id): Path<SignerId>) -> Result<Json<Signer>, BackendError> {
    db.read().await.signer(id).map(Json)
}

async fn delete_document(State(db): State<Db>, Path(id): Path<DocumentId>) -> Result<StatusCode, BackendError> {
    db.write().await.delete_document(id)?;
    Ok(StatusCode::NO_CONTENT)
}
