use kyc_platform::auth::{DirectoryError, UserDirectory, UserRecord};
use kyc_platform::workflows::onboarding::{
    ApplicationId, ApplicationRecord, ApplicationRepository, ApplicationStatus, DocumentId,
    DocumentStore, DocumentStoreError, MerchantId, RepositoryError, StatusChange, StoredDocument,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<String, ApplicationRecord>>>,
    documents: Arc<Mutex<Vec<(ApplicationId, StoredDocument)>>>,
    history: Arc<Mutex<Vec<StatusChange>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
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
        self.documents
            .lock()
            .expect("documents mutex poisoned")
            .push((application.clone(), document.clone()));
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

impl InMemoryApplicationRepository {
    pub(crate) fn history(&self) -> Vec<StatusChange> {
        self.history.lock().expect("history mutex poisoned").clone()
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryDocumentStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl DocumentStore for InMemoryDocumentStore {
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryUserDirectory {
    users: Arc<Mutex<HashMap<String, UserRecord>>>,
}

impl UserDirectory for InMemoryUserDirectory {
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
