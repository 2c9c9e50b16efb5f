use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{DirectoryError, UserDirectory};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ReviewDecision, ReviewLifecycle,
    StatusChange, StoredDocument,
};
use super::repository::{ApplicationRepository, RepositoryError};

/// List row for the reviewer console, joined with the merchant's account.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub merchant_name: String,
    pub email: String,
    pub business_name: String,
    pub country: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full reviewer view of one application.
#[derive(Debug, Clone)]
pub struct ApplicationDetail {
    pub record: ApplicationRecord,
    pub merchant_name: String,
    pub email: String,
    pub documents: Vec<StoredDocument>,
}

/// A reviewer's decision payload: target status plus an optional comment.
///
/// The comment is presented as required for rejections and document
/// requests, but is not enforced here; the mismatch is deliberate and is
/// logged rather than fixed (see DESIGN.md).
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub status: ReviewDecision,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Reviewer-side operations: the filterable queue and the decision action.
pub struct ReviewConsoleService<R, U> {
    repository: Arc<R>,
    directory: Arc<U>,
}

impl<R, U> ReviewConsoleService<R, U>
where
    R: ApplicationRepository,
    U: UserDirectory,
{
    pub fn new(repository: Arc<R>, directory: Arc<U>) -> Self {
        Self {
            repository,
            directory,
        }
    }

    /// Applications joined with merchant identity, newest update first.
    pub fn list(
        &self,
        filter: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationSummary>, ReviewError> {
        let mut records = self.repository.list(filter)?;
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let mut summaries = Vec::with_capacity(records.len());
        for record in records {
            let (merchant_name, email) = self.merchant_identity(&record)?;
            summaries.push(ApplicationSummary {
                id: record.id.clone(),
                merchant_name,
                email,
                business_name: record.profile.business_name.clone(),
                country: record.profile.country.clone(),
                status: record.status(),
                created_at: record.created_at,
                updated_at: record.updated_at,
            });
        }
        Ok(summaries)
    }

    /// One application with its documents and merchant identity.
    pub fn detail(&self, id: &ApplicationId) -> Result<ApplicationDetail, ReviewError> {
        let record = self.repository.fetch(id)?.ok_or(ReviewError::NotFound)?;
        let documents = self.repository.documents_for(id)?;
        let (merchant_name, email) = self.merchant_identity(&record)?;
        Ok(ApplicationDetail {
            record,
            merchant_name,
            email,
            documents,
        })
    }

    /// Record a decision on a pending application. Refused for any other
    /// status; the transition lands in the status history.
    pub fn decide(
        &self,
        id: &ApplicationId,
        reviewer: &str,
        request: ReviewRequest,
    ) -> Result<ApplicationRecord, ReviewError> {
        let mut record = self.repository.fetch(id)?.ok_or(ReviewError::NotFound)?;

        let current = record.status();
        if current != ApplicationStatus::Pending {
            return Err(ReviewError::NotPending { current });
        }

        let comment = request
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|comment| !comment.is_empty())
            .map(str::to_string);
        if request.status.is_adverse() && comment.is_none() {
            warn!(
                application = %record.id.0,
                decision = ?request.status,
                "adverse decision recorded without a comment"
            );
        }

        record.lifecycle = ReviewLifecycle::Decided {
            decision: request.status,
            comment: comment.clone(),
        };
        record.updated_at = Utc::now();
        self.repository.update(record.clone())?;
        self.repository.record_status_change(StatusChange {
            application_id: record.id.clone(),
            changed_by: reviewer.to_string(),
            old_status: current,
            new_status: request.status.status(),
            comment,
            changed_at: record.updated_at,
        })?;

        info!(
            application = %record.id.0,
            status = %record.status(),
            "review decision recorded"
        );
        Ok(record)
    }

    fn merchant_identity(&self, record: &ApplicationRecord) -> Result<(String, String), ReviewError> {
        Ok(self
            .directory
            .find(&record.merchant.0)?
            .map(|user| (user.full_name, user.email))
            .unwrap_or_else(|| ("Unknown".to_string(), String::new())))
    }
}

/// Error raised by reviewer-side operations.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("application not found")]
    NotFound,
    #[error("decision allowed only while pending (status is {current})")]
    NotPending { current: ApplicationStatus },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
