use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::auth::{DirectoryError, TokenSigner, UserDirectory, UserRecord};
use crate::config::AuthConfig;
use crate::workflows::onboarding::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, BusinessProfile, DocumentId,
    DocumentKind, MerchantId, ReviewLifecycle, StatusChange, StoredDocument,
};
use crate::workflows::onboarding::repository::{
    ApplicationRepository, DocumentStore, DocumentStoreError, RepositoryError,
};
use crate::workflows::onboarding::review::ReviewConsoleService;
use crate::workflows::onboarding::router::OnboardingApi;
use crate::workflows::onboarding::service::MerchantOnboardingService;
use crate::workflows::onboarding::wizard::{ApplicationGateway, GatewayError};

pub(super) fn merchant_id() -> MerchantId {
    MerchantId("merchant-1".to_string())
}

/// A form that passes both step gates.
pub(super) fn complete_profile() -> BusinessProfile {
    BusinessProfile {
        business_name: "Falcon Trading LLC".to_string(),
        business_category: "Retail".to_string(),
        business_subcategory: "Electronics".to_string(),
        free_zone: true,
        country: "United Arab Emirates".to_string(),
        website: "https://falcon.example".to_string(),
        business_description: "Consumer electronics storefront".to_string(),
        monthly_volume: "85000".to_string(),
        owner_name: "Amira Hassan".to_string(),
        contact_phone: "+971 50 000 0000".to_string(),
        contact_address: "12 Marina Walk, Dubai".to_string(),
    }
}

pub(super) fn record_with_lifecycle(lifecycle: ReviewLifecycle) -> ApplicationRecord {
    let now = chrono::Utc::now();
    ApplicationRecord {
        id: ApplicationId("app-1".to_string()),
        merchant: merchant_id(),
        profile: complete_profile(),
        lifecycle,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<String, ApplicationRecord>>,
    documents: Mutex<Vec<(ApplicationId, StoredDocument)>>,
    history: Mutex<Vec<StatusChange>>,
}

impl MemoryRepository {
    pub(super) fn history(&self) -> Vec<StatusChange> {
        self.history.lock().expect("history mutex poisoned").clone()
    }
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id.0) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.0.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id.0) {
            guard.insert(record.id.0.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn find_by_merchant(
        &self,
        merchant: &MerchantId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| record.merchant == *merchant)
            .cloned())
    }

    fn list(
        &self,
        filter: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| filter.map(|status| record.status() == status).unwrap_or(true))
            .cloned()
            .collect())
    }

    fn add_document(
        &self,
        application: &ApplicationId,
        document: StoredDocument,
    ) -> Result<StoredDocument, RepositoryError> {
        let mut guard = self.documents.lock().expect("documents mutex poisoned");
        guard.push((application.clone(), document.clone()));
        Ok(document)
    }

    fn documents_for(
        &self,
        application: &ApplicationId,
    ) -> Result<Vec<StoredDocument>, RepositoryError> {
        let guard = self.documents.lock().expect("documents mutex poisoned");
        Ok(guard
            .iter()
            .filter(|(owner, _)| owner == application)
            .map(|(_, document)| document.clone())
            .collect())
    }

    fn find_document(&self, id: &DocumentId) -> Result<Option<StoredDocument>, RepositoryError> {
        let guard = self.documents.lock().expect("documents mutex poisoned");
        Ok(guard
            .iter()
            .find(|(_, document)| document.id == *id)
            .map(|(_, document)| document.clone()))
    }

    fn record_status_change(&self, change: StatusChange) -> Result<(), RepositoryError> {
        self.history
            .lock()
            .expect("history mutex poisoned")
            .push(change);
        Ok(())
    }

    fn status_history(
        &self,
        application: &ApplicationId,
    ) -> Result<Vec<StatusChange>, RepositoryError> {
        let guard = self.history.lock().expect("history mutex poisoned");
        Ok(guard
            .iter()
            .filter(|change| change.application_id == *application)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl DocumentStore for MemoryStore {
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), DocumentStoreError> {
        self.blobs
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), bytes);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, DocumentStoreError> {
        self.blobs
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
            .ok_or(DocumentStoreError::NotFound)
    }
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl MemoryDirectory {
    pub(super) fn seed(&self, id: &str, email: &str, full_name: &str, role: crate::auth::Role) {
        let user = UserRecord {
            id: id.to_string(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            password_hash: crate::auth::hash_password("correct horse"),
            role,
            created_at: chrono::Utc::now(),
        };
        self.users
            .lock()
            .expect("directory mutex poisoned")
            .insert(user.id.clone(), user);
    }
}

impl UserDirectory for MemoryDirectory {
    fn insert(&self, user: UserRecord) -> Result<UserRecord, DirectoryError> {
        let mut guard = self.users.lock().expect("directory mutex poisoned");
        if guard.values().any(|existing| existing.email == user.email) {
            return Err(DirectoryError::Conflict);
        }
        guard.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let guard = self.users.lock().expect("directory mutex poisoned");
        Ok(guard.values().find(|user| user.email == email).cloned())
    }

    fn find(&self, id: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let guard = self.users.lock().expect("directory mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) fn signer() -> TokenSigner {
    TokenSigner::from_config(&AuthConfig {
        jwt_secret: "test-secret".to_string(),
        token_ttl_hours: 1,
    })
}

pub(super) fn merchant_service() -> (
    MerchantOnboardingService<MemoryRepository, MemoryStore>,
    Arc<MemoryRepository>,
    Arc<MemoryStore>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let store = Arc::new(MemoryStore::default());
    let service = MerchantOnboardingService::new(repository.clone(), store.clone());
    (service, repository, store)
}

pub(super) fn review_console() -> (
    ReviewConsoleService<MemoryRepository, MemoryDirectory>,
    MerchantOnboardingService<MemoryRepository, MemoryStore>,
    Arc<MemoryRepository>,
    Arc<MemoryDirectory>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(MemoryDirectory::default());
    directory.seed(
        "merchant-1",
        "amira@falcon.example",
        "Amira Hassan",
        crate::auth::Role::Merchant,
    );
    let review = ReviewConsoleService::new(repository.clone(), directory.clone());
    let merchant = MerchantOnboardingService::new(repository.clone(), store);
    (review, merchant, repository, directory)
}

pub(super) fn build_api() -> Arc<OnboardingApi<MemoryRepository, MemoryStore, MemoryDirectory>> {
    Arc::new(OnboardingApi::new(
        Arc::new(MemoryRepository::default()),
        Arc::new(MemoryStore::default()),
        Arc::new(MemoryDirectory::default()),
        signer(),
    ))
}

/// Gateway fake counting calls, with switchable failures.
#[derive(Default)]
pub(super) struct RecordingGateway {
    pub(super) saves: usize,
    pub(super) submits: usize,
    pub(super) uploads: Vec<(DocumentKind, String)>,
    pub(super) fail_save: bool,
    pub(super) fail_upload: bool,
}

impl ApplicationGateway for RecordingGateway {
    fn save(&mut self, _profile: &BusinessProfile) -> Result<ApplicationId, GatewayError> {
        if self.fail_save {
            return Err(GatewayError::new("Failed to save application"));
        }
        self.saves += 1;
        Ok(ApplicationId("app-1".to_string()))
    }

    fn submit(&mut self) -> Result<(), GatewayError> {
        self.submits += 1;
        Ok(())
    }

    fn upload(&mut self, kind: DocumentKind, original_name: &str) -> Result<(), GatewayError> {
        if self.fail_upload {
            return Err(GatewayError::new("Failed to upload file"));
        }
        self.uploads.push((kind, original_name.to_string()));
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
