//! Merchant onboarding: the application wizard, its lifecycle, and the
//! reviewer console.
//!
//! The wizard module is the client-core state machine (steps, touched
//! fields, validation, upload markers); the services own the server-side
//! lifecycle rules; the router exposes both over HTTP.

pub mod domain;
pub mod repository;
pub mod review;
pub mod router;
pub mod service;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    is_listed_pair, subcategories_for, ApplicationId, ApplicationRecord, ApplicationStatus,
    BusinessProfile, DocumentId, DocumentKind, MerchantId, ReviewDecision, ReviewLifecycle,
    StatusChange, StoredDocument, UnknownDocumentKind, UnknownStatus, BUSINESS_CATEGORIES,
};
pub use repository::{
    ApplicationRepository, DocumentStore, DocumentStoreError, RepositoryError,
};
pub use review::{
    ApplicationDetail, ApplicationSummary, ReviewConsoleService, ReviewError, ReviewRequest,
};
pub use router::{onboarding_router, ApplicationDetailView, ApplicationView, OnboardingApi};
pub use service::{MerchantOnboardingService, OnboardingError};
pub use wizard::{
    ApplicationGateway, Field, FieldIssue, GatewayError, OnboardingWizard, UploadState, WizardStep,
};
