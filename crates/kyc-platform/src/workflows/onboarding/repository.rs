use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, DocumentId, MerchantId, StatusChange,
    StoredDocument,
};

/// Storage abstraction for applications, their documents, and the status
/// audit trail, so the services can be exercised against in-memory
/// infrastructure.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    /// The merchant's application, if one exists. One per merchant.
    fn find_by_merchant(
        &self,
        merchant: &MerchantId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError>;
    /// All applications, optionally narrowed to one status.
    fn list(
        &self,
        filter: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn add_document(
        &self,
        application: &ApplicationId,
        document: StoredDocument,
    ) -> Result<StoredDocument, RepositoryError>;
    fn documents_for(
        &self,
        application: &ApplicationId,
    ) -> Result<Vec<StoredDocument>, RepositoryError>;
    fn find_document(&self, id: &DocumentId) -> Result<Option<StoredDocument>, RepositoryError>;
    fn record_status_change(&self, change: StatusChange) -> Result<(), RepositoryError>;
    fn status_history(
        &self,
        application: &ApplicationId,
    ) -> Result<Vec<StatusChange>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Blob storage for uploaded document content, keyed by storage key.
pub trait DocumentStore: Send + Sync {
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), DocumentStoreError>;
    fn get(&self, key: &str) -> Result<Vec<u8>, DocumentStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("document content not found")]
    NotFound,
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}
