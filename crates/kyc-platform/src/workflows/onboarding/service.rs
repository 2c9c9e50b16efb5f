use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::domain::{
    is_listed_pair, ApplicationId, ApplicationRecord, ApplicationStatus, BusinessProfile,
    DocumentId, DocumentKind, MerchantId, ReviewLifecycle, StatusChange, StoredDocument,
};
use super::repository::{
    ApplicationRepository, DocumentStore, DocumentStoreError, RepositoryError,
};

/// Merchant-side operations: the save/submit/upload effects behind the
/// onboarding wizard.
pub struct MerchantOnboardingService<R, S> {
    repository: Arc<R>,
    store: Arc<S>,
}

impl<R, S> MerchantOnboardingService<R, S>
where
    R: ApplicationRepository,
    S: DocumentStore,
{
    pub fn new(repository: Arc<R>, store: Arc<S>) -> Self {
        Self { repository, store }
    }

    /// The merchant's application, if any.
    pub fn current(
        &self,
        merchant: &MerchantId,
    ) -> Result<Option<ApplicationRecord>, OnboardingError> {
        Ok(self.repository.find_by_merchant(merchant)?)
    }

    /// Create the merchant's application as a draft, or update the existing
    /// one. Updates are refused once the application is read-only, and a
    /// chosen subcategory must belong to the chosen category.
    pub fn save_draft(
        &self,
        merchant: &MerchantId,
        profile: BusinessProfile,
    ) -> Result<ApplicationRecord, OnboardingError> {
        let subcategory = profile.business_subcategory.trim();
        if !subcategory.is_empty() && !is_listed_pair(profile.business_category.trim(), subcategory)
        {
            return Err(OnboardingError::UnknownSubcategory {
                category: profile.business_category.clone(),
                subcategory: subcategory.to_string(),
            });
        }

        match self.repository.find_by_merchant(merchant)? {
            Some(mut record) => {
                if !record.lifecycle.is_editable() {
                    return Err(OnboardingError::NotEditable {
                        status: record.status(),
                    });
                }
                record.profile = profile;
                record.updated_at = Utc::now();
                self.repository.update(record.clone())?;
                Ok(record)
            }
            None => {
                let now = Utc::now();
                let record = ApplicationRecord {
                    id: ApplicationId(Uuid::new_v4().to_string()),
                    merchant: merchant.clone(),
                    profile,
                    lifecycle: ReviewLifecycle::Draft,
                    created_at: now,
                    updated_at: now,
                };
                let stored = self.repository.insert(record)?;
                info!(application = %stored.id.0, "application created");
                Ok(stored)
            }
        }
    }

    /// Submit the application for review: editable statuses only, and the
    /// transition lands in the status history.
    pub fn submit(&self, merchant: &MerchantId) -> Result<ApplicationRecord, OnboardingError> {
        let mut record = self
            .repository
            .find_by_merchant(merchant)?
            .ok_or(OnboardingError::NoApplication)?;

        if !record.lifecycle.is_editable() {
            return Err(OnboardingError::NotSubmittable {
                status: record.status(),
            });
        }

        let old_status = record.status();
        record.lifecycle = ReviewLifecycle::PendingReview;
        record.updated_at = Utc::now();
        self.repository.update(record.clone())?;
        self.repository.record_status_change(StatusChange {
            application_id: record.id.clone(),
            changed_by: merchant.0.clone(),
            old_status,
            new_status: ApplicationStatus::Pending,
            comment: None,
            changed_at: record.updated_at,
        })?;

        info!(application = %record.id.0, from = %old_status, "application submitted for review");
        Ok(record)
    }

    /// Store one uploaded document. Requires an existing application; every
    /// upload is kept (replacement markers are client-side only).
    pub fn attach_document(
        &self,
        merchant: &MerchantId,
        kind: DocumentKind,
        original_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredDocument, OnboardingError> {
        let record = self
            .repository
            .find_by_merchant(merchant)?
            .ok_or(OnboardingError::NoApplication)?;

        let id = DocumentId(Uuid::new_v4().to_string());
        let storage_key = format!("applications/{}/{}/{}", record.id.0, kind.key(), id.0);
        let size = bytes.len() as u64;
        self.store.put(&storage_key, bytes)?;

        let document = StoredDocument {
            id,
            kind,
            original_name: original_name.to_string(),
            content_type: content_type.to_string(),
            size,
            storage_key,
            uploaded_at: Utc::now(),
        };
        let stored = self.repository.add_document(&record.id, document)?;
        info!(
            application = %record.id.0,
            doc_type = %kind,
            name = %stored.original_name,
            "document uploaded"
        );
        Ok(stored)
    }
}

/// Error raised by merchant-side onboarding operations.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("create an application first")]
    NoApplication,
    #[error("application is read-only while status is {status}")]
    NotEditable { status: ApplicationStatus },
    #[error("application cannot be submitted while status is {status}")]
    NotSubmittable { status: ApplicationStatus },
    #[error("subcategory '{subcategory}' does not belong to category '{category}'")]
    UnknownSubcategory {
        category: String,
        subcategory: String,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Store(#[from] DocumentStoreError),
}
