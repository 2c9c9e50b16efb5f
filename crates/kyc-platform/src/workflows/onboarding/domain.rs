use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for merchant accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MerchantId(pub String);

/// Identifier wrapper for onboarding applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for uploaded documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

/// Wire-level application status, as exchanged with clients and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    NeedsMoreDocs,
}

impl ApplicationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::NeedsMoreDocs => "needs_more_docs",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "Draft",
            ApplicationStatus::Pending => "Under review",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::NeedsMoreDocs => "More documents needed",
        }
    }

    /// Whether merchants may still edit an application in this status.
    pub const fn is_editable(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Draft
                | ApplicationStatus::Rejected
                | ApplicationStatus::NeedsMoreDocs
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(ApplicationStatus::Draft),
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "needs_more_docs" => Ok(ApplicationStatus::NeedsMoreDocs),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown application status '{0}'")]
pub struct UnknownStatus(pub String);

/// A reviewer's verdict on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
    NeedsMoreDocs,
}

impl ReviewDecision {
    pub const fn status(self) -> ApplicationStatus {
        match self {
            ReviewDecision::Approved => ApplicationStatus::Approved,
            ReviewDecision::Rejected => ApplicationStatus::Rejected,
            ReviewDecision::NeedsMoreDocs => ApplicationStatus::NeedsMoreDocs,
        }
    }

    /// Decisions that expect an explanation to accompany them.
    pub const fn is_adverse(self) -> bool {
        matches!(self, ReviewDecision::Rejected | ReviewDecision::NeedsMoreDocs)
    }
}

/// Where an application sits in its review lifecycle.
///
/// A sum type rather than a bare status flag: the reviewer comment only
/// exists once a decision does, and editability falls out of the shape
/// instead of being policed by a separate boolean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReviewLifecycle {
    Draft,
    PendingReview,
    Decided {
        decision: ReviewDecision,
        comment: Option<String>,
    },
}

impl ReviewLifecycle {
    pub fn status(&self) -> ApplicationStatus {
        match self {
            ReviewLifecycle::Draft => ApplicationStatus::Draft,
            ReviewLifecycle::PendingReview => ApplicationStatus::Pending,
            ReviewLifecycle::Decided { decision, .. } => decision.status(),
        }
    }

    pub fn is_editable(&self) -> bool {
        self.status().is_editable()
    }

    pub fn reviewer_comment(&self) -> Option<&str> {
        match self {
            ReviewLifecycle::Decided { comment, .. } => comment.as_deref(),
            _ => None,
        }
    }
}

/// The merchant-entered application form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub business_name: String,
    pub business_category: String,
    pub business_subcategory: String,
    #[serde(default)]
    pub free_zone: bool,
    pub country: String,
    pub website: String,
    pub business_description: String,
    /// Unformatted numeric string, e.g. "85000" or "1250.50".
    pub monthly_volume: String,
    pub owner_name: String,
    pub contact_phone: String,
    pub contact_address: String,
}

/// The fixed business category catalog with its subcategory sets.
pub const BUSINESS_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "E-commerce",
        &["Online Retail", "Marketplace", "Digital Goods", "Subscriptions"],
    ),
    (
        "Retail",
        &["Clothing", "Electronics", "Food & Grocery", "Furniture"],
    ),
    (
        "Services",
        &["Consulting", "Freelance", "Cleaning", "Maintenance"],
    ),
    (
        "Technology",
        &["SaaS", "Mobile Apps", "IT Services", "Cybersecurity"],
    ),
    (
        "Healthcare",
        &["Pharmacy", "Clinic", "Telemedicine", "Medical Devices"],
    ),
    (
        "Education",
        &["Online Courses", "Tutoring", "Training", "Certification"],
    ),
    (
        "Travel",
        &["Hotel", "Tour Operator", "Car Rental", "Airlines"],
    ),
    (
        "Food & Beverage",
        &["Restaurant", "Catering", "Delivery", "Cafe"],
    ),
    (
        "Finance",
        &["Lending", "Insurance", "Investment", "Accounting"],
    ),
    ("Other", &["Other"]),
];

/// The subcategory set for a category, if the category is in the catalog.
pub fn subcategories_for(category: &str) -> Option<&'static [&'static str]> {
    BUSINESS_CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, subcategories)| *subcategories)
}

/// Whether the category/subcategory pair appears in the catalog.
pub fn is_listed_pair(category: &str, subcategory: &str) -> bool {
    subcategories_for(category)
        .map(|listed| listed.contains(&subcategory))
        .unwrap_or(false)
}

/// The fixed set of document types merchants can upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Passport,
    Visa,
    IdentityDocument,
    BusinessLicense,
    MemorandumOfAssociation,
    BusinessDocuments,
    Other,
}

impl DocumentKind {
    pub const ALL: [Self; 7] = [
        Self::Passport,
        Self::Visa,
        Self::IdentityDocument,
        Self::BusinessLicense,
        Self::MemorandumOfAssociation,
        Self::BusinessDocuments,
        Self::Other,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Passport => "passport",
            Self::Visa => "visa",
            Self::IdentityDocument => "identity_document",
            Self::BusinessLicense => "business_license",
            Self::MemorandumOfAssociation => "memorandum_of_association",
            Self::BusinessDocuments => "business_documents",
            Self::Other => "other",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Passport => "Passport",
            Self::Visa => "Visa",
            Self::IdentityDocument => "Identity Document",
            Self::BusinessLicense => "Business License",
            Self::MemorandumOfAssociation => "Memorandum of Association",
            Self::BusinessDocuments => "Business Documents",
            Self::Other => "Additional Information",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Passport => "Valid passport of the business owner",
            Self::Visa => "Current visa if applicable",
            Self::IdentityDocument => "National ID or Emirates ID",
            Self::BusinessLicense => "Official business license",
            Self::MemorandumOfAssociation => "MOA or Articles of Association",
            Self::BusinessDocuments => "Bank statements, invoices, etc.",
            Self::Other => "Any other supporting documents",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DocumentKind {
    type Err = UnknownDocumentKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        DocumentKind::ALL
            .into_iter()
            .find(|kind| kind.key() == value)
            .ok_or_else(|| UnknownDocumentKind(value.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown document type '{0}'")]
pub struct UnknownDocumentKind(pub String);

/// An uploaded document's metadata. Created by upload, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub kind: DocumentKind,
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}

/// One merchant's onboarding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub merchant: MerchantId,
    pub profile: BusinessProfile,
    pub lifecycle: ReviewLifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRecord {
    pub fn status(&self) -> ApplicationStatus {
        self.lifecycle.status()
    }

    pub fn reviewer_comment(&self) -> Option<&str> {
        self.lifecycle.reviewer_comment()
    }
}

/// Audit-trail entry appended on every lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub application_id: ApplicationId,
    pub changed_by: String,
    pub old_status: ApplicationStatus,
    pub new_status: ApplicationStatus,
    pub comment: Option<String>,
    pub changed_at: DateTime<Utc>,
}
