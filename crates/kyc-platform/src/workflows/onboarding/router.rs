use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{
    AuthError, AuthService, AuthSession, LoginRequest, RegisterRequest, Role, TokenSigner,
    UserDirectory,
};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, BusinessProfile, DocumentId, DocumentKind,
    MerchantId,
};
use super::repository::{ApplicationRepository, DocumentStore};
use super::review::{ApplicationDetail, ReviewConsoleService, ReviewError, ReviewRequest};
use super::service::{MerchantOnboardingService, OnboardingError};

/// The composed API: auth, the merchant-side service, and the reviewer
/// console over one repository, document store, and user directory.
pub struct OnboardingApi<R, S, U> {
    auth: AuthService<U>,
    merchant: MerchantOnboardingService<R, S>,
    review: ReviewConsoleService<R, U>,
    repository: Arc<R>,
    store: Arc<S>,
}

impl<R, S, U> OnboardingApi<R, S, U>
where
    R: ApplicationRepository,
    S: DocumentStore,
    U: UserDirectory,
{
    pub fn new(
        repository: Arc<R>,
        store: Arc<S>,
        directory: Arc<U>,
        signer: TokenSigner,
    ) -> Self {
        Self {
            auth: AuthService::new(directory.clone(), signer),
            merchant: MerchantOnboardingService::new(repository.clone(), store.clone()),
            review: ReviewConsoleService::new(repository.clone(), directory),
            repository,
            store,
        }
    }

    pub fn auth(&self) -> &AuthService<U> {
        &self.auth
    }

    pub fn merchant(&self) -> &MerchantOnboardingService<R, S> {
        &self.merchant
    }

    pub fn review(&self) -> &ReviewConsoleService<R, U> {
        &self.review
    }
}

/// Router builder exposing the REST surface consumed by the merchant wizard
/// and the reviewer console.
pub fn onboarding_router<R, S, U>(api: Arc<OnboardingApi<R, S, U>>) -> Router
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
    U: UserDirectory + 'static,
{
    Router::new()
        .route("/api/auth/register", post(register_handler::<R, S, U>))
        .route("/api/auth/login", post(login_handler::<R, S, U>))
        .route(
            "/api/application",
            get(my_application_handler::<R, S, U>)
                .post(create_application_handler::<R, S, U>)
                .put(update_application_handler::<R, S, U>),
        )
        .route(
            "/api/application/submit",
            post(submit_application_handler::<R, S, U>),
        )
        .route(
            "/api/application/documents",
            post(upload_document_handler::<R, S, U>),
        )
        .route("/api/applications", get(list_applications_handler::<R, S, U>))
        .route(
            "/api/applications/:id",
            get(application_detail_handler::<R, S, U>),
        )
        .route(
            "/api/applications/:id/review",
            post(review_application_handler::<R, S, U>),
        )
        .route(
            "/api/documents/:id/url",
            get(document_url_handler::<R, S, U>),
        )
        .with_state(api)
}

/// Wire view of one application.
#[derive(Debug, Serialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub business_name: String,
    pub business_category: String,
    pub business_subcategory: String,
    pub free_zone: bool,
    pub country: String,
    pub website: String,
    pub business_description: String,
    pub monthly_volume: String,
    pub owner_name: String,
    pub contact_phone: String,
    pub contact_address: String,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ApplicationRecord> for ApplicationView {
    fn from(record: &ApplicationRecord) -> Self {
        let profile = &record.profile;
        Self {
            id: record.id.clone(),
            business_name: profile.business_name.clone(),
            business_category: profile.business_category.clone(),
            business_subcategory: profile.business_subcategory.clone(),
            free_zone: profile.free_zone,
            country: profile.country.clone(),
            website: profile.website.clone(),
            business_description: profile.business_description.clone(),
            monthly_volume: profile.monthly_volume.clone(),
            owner_name: profile.owner_name.clone(),
            contact_phone: profile.contact_phone.clone(),
            contact_address: profile.contact_address.clone(),
            status: record.status(),
            reviewer_comment: record.reviewer_comment().map(str::to_string),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Wire view of one uploaded document.
#[derive(Debug, Serialize)]
pub struct DocumentView {
    pub id: DocumentId,
    pub doc_type: DocumentKind,
    pub original_name: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Reviewer detail view: the application plus merchant identity and docs.
#[derive(Debug, Serialize)]
pub struct ApplicationDetailView {
    #[serde(flatten)]
    pub application: ApplicationView,
    pub merchant_name: String,
    pub email: String,
    pub documents: Vec<DocumentView>,
}

impl From<&ApplicationDetail> for ApplicationDetailView {
    fn from(detail: &ApplicationDetail) -> Self {
        Self {
            application: ApplicationView::from(&detail.record),
            merchant_name: detail.merchant_name.clone(),
            email: detail.email.clone(),
            documents: detail
                .documents
                .iter()
                .map(|document| DocumentView {
                    id: document.id.clone(),
                    doc_type: document.kind,
                    original_name: document.original_name.clone(),
                    uploaded_at: document.uploaded_at,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenQuery {
    #[serde(default)]
    token: Option<String>,
}

fn error_response(status: StatusCode, message: impl fmt::Display) -> Response {
    (status, Json(json!({ "error": message.to_string() }))).into_response()
}

/// Resolve the caller from the `Authorization: Bearer` header, falling back
/// to a `?token=` query parameter (used by document links opened in a new
/// view).
fn authorize<R, S, U>(
    api: &OnboardingApi<R, S, U>,
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Result<AuthSession, Response>
where
    R: ApplicationRepository,
    S: DocumentStore,
    U: UserDirectory,
{
    let header_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let token = match header_token.or(query_token) {
        Some(token) if !token.is_empty() => token,
        _ => return Err(error_response(StatusCode::UNAUTHORIZED, "Token required")),
    };

    api.auth
        .authorize(token)
        .map_err(|_| error_response(StatusCode::UNAUTHORIZED, "Invalid token"))
}

fn require_reviewer(session: &AuthSession) -> Result<(), Response> {
    if session.role == Role::Reviewer {
        Ok(())
    } else {
        Err(error_response(StatusCode::FORBIDDEN, "Access denied"))
    }
}

fn onboarding_error_response(error: OnboardingError) -> Response {
    let status = match &error {
        OnboardingError::NoApplication => StatusCode::BAD_REQUEST,
        OnboardingError::NotEditable { .. } | OnboardingError::NotSubmittable { .. } => {
            StatusCode::CONFLICT
        }
        OnboardingError::UnknownSubcategory { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        OnboardingError::Repository(_) | OnboardingError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, error)
}

fn review_error_response(error: ReviewError) -> Response {
    let status = match &error {
        ReviewError::NotFound => StatusCode::NOT_FOUND,
        ReviewError::NotPending { .. } => StatusCode::CONFLICT,
        ReviewError::Repository(_) | ReviewError::Directory(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, error)
}

pub(crate) async fn register_handler<R, S, U>(
    State(api): State<Arc<OnboardingApi<R, S, U>>>,
    Json(request): Json<RegisterRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
    U: UserDirectory + 'static,
{
    match api.auth.register(request) {
        Ok(issued) => (StatusCode::CREATED, Json(issued)).into_response(),
        Err(AuthError::EmailTaken) => {
            error_response(StatusCode::CONFLICT, "Email already registered")
        }
        Err(err @ AuthError::PasswordTooShort) => error_response(StatusCode::BAD_REQUEST, err),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

pub(crate) async fn login_handler<R, S, U>(
    State(api): State<Arc<OnboardingApi<R, S, U>>>,
    Json(request): Json<LoginRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
    U: UserDirectory + 'static,
{
    match api.auth.login(request) {
        Ok(issued) => (StatusCode::OK, Json(issued)).into_response(),
        Err(err @ AuthError::InvalidCredentials) => error_response(StatusCode::UNAUTHORIZED, err),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

pub(crate) async fn my_application_handler<R, S, U>(
    State(api): State<Arc<OnboardingApi<R, S, U>>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
    U: UserDirectory + 'static,
{
    let session = match authorize(&api, &headers, None) {
        Ok(session) => session,
        Err(response) => return response,
    };

    match api.merchant.current(&MerchantId(session.user_id)) {
        Ok(Some(record)) => Json(ApplicationView::from(&record)).into_response(),
        Ok(None) => Json(json!({})).into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

pub(crate) async fn create_application_handler<R, S, U>(
    State(api): State<Arc<OnboardingApi<R, S, U>>>,
    headers: HeaderMap,
    Json(profile): Json<BusinessProfile>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
    U: UserDirectory + 'static,
{
    let session = match authorize(&api, &headers, None) {
        Ok(session) => session,
        Err(response) => return response,
    };

    match api.merchant.save_draft(&MerchantId(session.user_id), profile) {
        Ok(record) => (
            StatusCode::CREATED,
            Json(json!({ "id": record.id.0, "status": record.status() })),
        )
            .into_response(),
        Err(err) => onboarding_error_response(err),
    }
}

pub(crate) async fn update_application_handler<R, S, U>(
    State(api): State<Arc<OnboardingApi<R, S, U>>>,
    headers: HeaderMap,
    Json(profile): Json<BusinessProfile>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
    U: UserDirectory + 'static,
{
    let session = match authorize(&api, &headers, None) {
        Ok(session) => session,
        Err(response) => return response,
    };

    match api.merchant.save_draft(&MerchantId(session.user_id), profile) {
        Ok(record) => Json(ApplicationView::from(&record)).into_response(),
        Err(err) => onboarding_error_response(err),
    }
}

pub(crate) async fn submit_application_handler<R, S, U>(
    State(api): State<Arc<OnboardingApi<R, S, U>>>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
    U: UserDirectory + 'static,
{
    let session = match authorize(&api, &headers, None) {
        Ok(session) => session,
        Err(response) => return response,
    };

    match api.merchant.submit(&MerchantId(session.user_id)) {
        Ok(_) => Json(json!({ "message": "Application submitted for review" })).into_response(),
        Err(err) => onboarding_error_response(err),
    }
}

pub(crate) async fn upload_document_handler<R, S, U>(
    State(api): State<Arc<OnboardingApi<R, S, U>>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
    U: UserDirectory + 'static,
{
    let session = match authorize(&api, &headers, None) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let mut doc_type: Option<String> = None;
    let mut file: Option<(String, String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return error_response(StatusCode::BAD_REQUEST, err),
        };
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("doc_type") => match field.text().await {
                Ok(text) => doc_type = Some(text),
                Err(err) => return error_response(StatusCode::BAD_REQUEST, err),
            },
            Some("file") => {
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => file = Some((original_name, content_type, bytes.to_vec())),
                    Err(err) => return error_response(StatusCode::BAD_REQUEST, err),
                }
            }
            _ => {}
        }
    }

    let kind = match doc_type.as_deref() {
        None | Some("") => return error_response(StatusCode::BAD_REQUEST, "doc_type is required"),
        Some(raw) => match DocumentKind::from_str(raw) {
            Ok(kind) => kind,
            Err(err) => return error_response(StatusCode::BAD_REQUEST, err),
        },
    };
    let Some((original_name, content_type, bytes)) = file else {
        return error_response(StatusCode::BAD_REQUEST, "File not found");
    };

    match api.merchant.attach_document(
        &MerchantId(session.user_id),
        kind,
        &original_name,
        &content_type,
        bytes,
    ) {
        Ok(document) => (
            StatusCode::CREATED,
            Json(json!({
                "id": document.id.0,
                "original_name": document.original_name,
                "doc_type": document.kind,
            })),
        )
            .into_response(),
        Err(err) => onboarding_error_response(err),
    }
}

pub(crate) async fn list_applications_handler<R, S, U>(
    State(api): State<Arc<OnboardingApi<R, S, U>>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
    U: UserDirectory + 'static,
{
    let session = match authorize(&api, &headers, None) {
        Ok(session) => session,
        Err(response) => return response,
    };
    if let Err(response) = require_reviewer(&session) {
        return response;
    }

    let filter = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => match ApplicationStatus::from_str(raw) {
            Ok(status) => Some(status),
            Err(err) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, err),
        },
    };

    match api.review.list(filter) {
        Ok(summaries) => Json(summaries).into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}

pub(crate) async fn application_detail_handler<R, S, U>(
    State(api): State<Arc<OnboardingApi<R, S, U>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
    U: UserDirectory + 'static,
{
    let session = match authorize(&api, &headers, None) {
        Ok(session) => session,
        Err(response) => return response,
    };
    if let Err(response) = require_reviewer(&session) {
        return response;
    }

    match api.review.detail(&ApplicationId(id)) {
        Ok(detail) => Json(ApplicationDetailView::from(&detail)).into_response(),
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn review_application_handler<R, S, U>(
    State(api): State<Arc<OnboardingApi<R, S, U>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
    U: UserDirectory + 'static,
{
    let session = match authorize(&api, &headers, None) {
        Ok(session) => session,
        Err(response) => return response,
    };
    if let Err(response) = require_reviewer(&session) {
        return response;
    }

    match api
        .review
        .decide(&ApplicationId(id), &session.user_id, request)
    {
        Ok(record) => {
            Json(json!({ "message": "Status updated", "status": record.status() })).into_response()
        }
        Err(err) => review_error_response(err),
    }
}

pub(crate) async fn document_url_handler<R, S, U>(
    State(api): State<Arc<OnboardingApi<R, S, U>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Response
where
    R: ApplicationRepository + 'static,
    S: DocumentStore + 'static,
    U: UserDirectory + 'static,
{
    if let Err(response) = authorize(&api, &headers, query.token.as_deref()) {
        return response;
    }

    let document = match api.repository.find_document(&DocumentId(id)) {
        Ok(Some(document)) => document,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Document not found"),
        Err(err) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    };

    match api.store.get(&document.storage_key) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, document.content_type.clone()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename=\"{}\"", document.original_name),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err),
    }
}
