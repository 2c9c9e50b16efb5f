//! The onboarding wizard state machine.
//!
//! Four ordered steps gated by per-step field validation, with the review
//! status of the saved application deciding whether the form is editable at
//! all. Side effects (saving, submitting, uploading) go through the
//! [`ApplicationGateway`] trait so the machine can be driven without a
//! network: forward transitions out of the two form steps save first and
//! only advance once the save succeeds.

mod fields;
mod rules;

pub use fields::{Field, BUSINESS_STEP_FIELDS, CONTACT_STEP_FIELDS};
pub use rules::{group_thousands, is_valid_volume, normalize_volume, FieldIssue};

use std::collections::{BTreeMap, BTreeSet};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, BusinessProfile, DocumentKind,
};

/// The four ordered wizard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Business,
    Contact,
    Documents,
    Submit,
}

impl WizardStep {
    pub const fn ordered() -> [Self; 4] {
        [Self::Business, Self::Contact, Self::Documents, Self::Submit]
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Business => 0,
            Self::Contact => 1,
            Self::Documents => 2,
            Self::Submit => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Business => "Business",
            Self::Contact => "Contact",
            Self::Documents => "Documents",
            Self::Submit => "Submit",
        }
    }

    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Business => None,
            Self::Contact => Some(Self::Business),
            Self::Documents => Some(Self::Contact),
            Self::Submit => Some(Self::Documents),
        }
    }

    /// Fields that must validate before leaving this step going forward.
    pub fn gated_fields(self) -> &'static [Field] {
        match self {
            Self::Business => &BUSINESS_STEP_FIELDS,
            Self::Contact => &CONTACT_STEP_FIELDS,
            Self::Documents | Self::Submit => &[],
        }
    }
}

/// Effect boundary for the wizard. Implementations call the backing service
/// (or network client); the wizard only cares whether the call succeeded.
pub trait ApplicationGateway {
    /// Create the application if it does not exist yet, otherwise update it.
    fn save(&mut self, profile: &BusinessProfile) -> Result<ApplicationId, GatewayError>;
    /// Submit the saved application for review.
    fn submit(&mut self) -> Result<(), GatewayError>;
    /// Upload one document of the given kind.
    fn upload(&mut self, kind: DocumentKind, original_name: &str) -> Result<(), GatewayError>;
}

/// Generic failure from the gateway. No structured codes: the contract is
/// "do not advance on failure", and the message is all the UI shows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GatewayError {
    pub message: String,
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Per-document-kind upload progress. Re-uploading a kind replaces the
/// entry: last write wins client-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Uploading,
    Uploaded { filename: String },
    Failed { reason: String },
}

/// Why a forward transition was refused.
#[derive(Debug, thiserror::Error)]
pub enum AdvanceError {
    #[error("step fields failed validation")]
    Validation(Vec<FieldIssue>),
    #[error("failed to save application: {0}")]
    Save(GatewayError),
    #[error(transparent)]
    Locked(#[from] WizardLocked),
    #[error("already at the final step")]
    AtFinalStep,
}

/// Why `submit` was refused.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("application is already under review or approved")]
    AlreadyUnderReview,
    #[error("the submit step has not been reached")]
    NotAtSubmitStep,
    #[error("no saved application to submit")]
    NothingToSubmit,
    #[error("failed to submit application: {0}")]
    Save(GatewayError),
}

/// Why an upload was refused or failed.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Locked(#[from] WizardLocked),
    #[error("upload failed: {0}")]
    Gateway(GatewayError),
}

/// Raised when editing is attempted while the application is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("application is read-only while status is {status}")]
pub struct WizardLocked {
    pub status: ApplicationStatus,
}

/// Ephemeral client-side wizard state for one merchant's application.
#[derive(Debug, Clone)]
pub struct OnboardingWizard {
    step: WizardStep,
    profile: BusinessProfile,
    touched: BTreeSet<Field>,
    application_id: Option<ApplicationId>,
    status: Option<ApplicationStatus>,
    uploads: BTreeMap<DocumentKind, UploadState>,
}

impl Default for OnboardingWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingWizard {
    /// A fresh wizard with an empty form, opened at the Business step.
    pub fn new() -> Self {
        Self {
            step: WizardStep::Business,
            profile: BusinessProfile::default(),
            touched: BTreeSet::new(),
            application_id: None,
            status: None,
            uploads: BTreeMap::new(),
        }
    }

    /// Hydrate from a fetched application. Opens directly at the Submit step
    /// when the application is already pending or approved.
    pub fn resume(record: &ApplicationRecord) -> Self {
        let status = record.status();
        let step = match status {
            ApplicationStatus::Pending | ApplicationStatus::Approved => WizardStep::Submit,
            _ => WizardStep::Business,
        };
        Self {
            step,
            profile: record.profile.clone(),
            touched: BTreeSet::new(),
            application_id: Some(record.id.clone()),
            status: Some(status),
            uploads: BTreeMap::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn profile(&self) -> &BusinessProfile {
        &self.profile
    }

    pub fn application_id(&self) -> Option<&ApplicationId> {
        self.application_id.as_ref()
    }

    pub fn status(&self) -> Option<ApplicationStatus> {
        self.status
    }

    /// Editable while there is no saved application yet, or while the saved
    /// one is in an editable status.
    pub fn can_edit(&self) -> bool {
        self.status.map(ApplicationStatus::is_editable).unwrap_or(true)
    }

    /// Adopt the status reported by a refetch, e.g. after a review decision
    /// reopened the application.
    pub fn sync_status(&mut self, status: ApplicationStatus) {
        self.status = Some(status);
    }

    pub fn touch(&mut self, field: Field) {
        self.touched.insert(field);
    }

    pub fn is_touched(&self, field: Field) -> bool {
        self.touched.contains(&field)
    }

    /// The inline error for a field, or `None` while the field is untouched
    /// or valid. Untouched fields are never invalid.
    pub fn field_error(&self, field: Field) -> Option<FieldIssue> {
        if !self.touched.contains(&field) {
            return None;
        }
        rules::field_issue(&self.profile, field)
    }

    pub fn is_invalid(&self, field: Field) -> bool {
        self.field_error(field).is_some()
    }

    /// Set a field value. Changing the category resets the subcategory; the
    /// monthly volume is stored whitespace-stripped.
    pub fn set_field(&mut self, field: Field, value: &str) -> Result<(), WizardLocked> {
        self.ensure_editable()?;
        match field {
            Field::BusinessName => self.profile.business_name = value.to_string(),
            Field::BusinessCategory => {
                if self.profile.business_category != value {
                    self.profile.business_subcategory.clear();
                }
                self.profile.business_category = value.to_string();
            }
            Field::BusinessSubcategory => self.profile.business_subcategory = value.to_string(),
            Field::Country => self.profile.country = value.to_string(),
            Field::Website => self.profile.website = value.to_string(),
            Field::BusinessDescription => self.profile.business_description = value.to_string(),
            Field::MonthlyVolume => self.profile.monthly_volume = normalize_volume(value),
            Field::OwnerName => self.profile.owner_name = value.to_string(),
            Field::ContactPhone => self.profile.contact_phone = value.to_string(),
            Field::ContactAddress => self.profile.contact_address = value.to_string(),
        }
        Ok(())
    }

    pub fn set_free_zone(&mut self, free_zone: bool) -> Result<(), WizardLocked> {
        self.ensure_editable()?;
        self.profile.free_zone = free_zone;
        Ok(())
    }

    /// The monthly volume grouped for display ("85000" renders "85 000");
    /// the stored value stays unformatted.
    pub fn volume_display(&self) -> String {
        if self.profile.monthly_volume.is_empty() {
            String::new()
        } else {
            group_thousands(&self.profile.monthly_volume)
        }
    }

    /// Validate a step's gated fields, touching all of them so every error
    /// surfaces at once. Returns the issues found; empty means the step
    /// passes.
    pub fn validate_step(&mut self, step: WizardStep) -> Vec<FieldIssue> {
        let fields = step.gated_fields();
        for field in fields {
            self.touched.insert(*field);
        }
        fields
            .iter()
            .filter_map(|field| rules::field_issue(&self.profile, *field))
            .collect()
    }

    /// Move forward one step. The two form steps validate and save before
    /// the step index changes; a failed save leaves the step unchanged.
    pub fn advance(
        &mut self,
        gateway: &mut dyn ApplicationGateway,
    ) -> Result<WizardStep, AdvanceError> {
        match self.step {
            WizardStep::Business | WizardStep::Contact => {
                self.ensure_editable()?;
                let issues = self.validate_step(self.step);
                if !issues.is_empty() {
                    return Err(AdvanceError::Validation(issues));
                }
                let id = gateway.save(&self.profile).map_err(AdvanceError::Save)?;
                if self.application_id.is_none() {
                    self.status = Some(ApplicationStatus::Draft);
                }
                self.application_id = Some(id);
                self.step = match self.step {
                    WizardStep::Business => WizardStep::Contact,
                    _ => WizardStep::Documents,
                };
            }
            WizardStep::Documents => self.step = WizardStep::Submit,
            WizardStep::Submit => return Err(AdvanceError::AtFinalStep),
        }
        Ok(self.step)
    }

    /// Move back one step. Unconditional: no validation, no gateway call.
    pub fn back(&mut self) -> Option<WizardStep> {
        let previous = self.step.previous()?;
        self.step = previous;
        Some(previous)
    }

    /// Submit for review. Refused while already pending or approved; on
    /// success the local status snapshot becomes pending.
    pub fn submit(&mut self, gateway: &mut dyn ApplicationGateway) -> Result<(), SubmitError> {
        if self.step != WizardStep::Submit {
            return Err(SubmitError::NotAtSubmitStep);
        }
        if matches!(
            self.status,
            Some(ApplicationStatus::Pending | ApplicationStatus::Approved)
        ) {
            return Err(SubmitError::AlreadyUnderReview);
        }
        if self.application_id.is_none() {
            return Err(SubmitError::NothingToSubmit);
        }
        gateway.submit().map_err(SubmitError::Save)?;
        self.status = Some(ApplicationStatus::Pending);
        Ok(())
    }

    /// Jump back to the Business step to edit and resubmit. Only offered
    /// after a rejection or a request for more documents; returns whether
    /// the shortcut applied. Field values are kept.
    pub fn edit_and_resubmit(&mut self) -> bool {
        match self.status {
            Some(ApplicationStatus::Rejected | ApplicationStatus::NeedsMoreDocs) => {
                self.step = WizardStep::Business;
                true
            }
            _ => false,
        }
    }

    /// Upload one document: the kind is marked uploading, the gateway is
    /// invoked immediately, and the outcome replaces the marker. Uploads of
    /// distinct kinds are independent and unordered.
    pub fn upload(
        &mut self,
        gateway: &mut dyn ApplicationGateway,
        kind: DocumentKind,
        original_name: &str,
    ) -> Result<(), UploadError> {
        self.begin_upload(kind)?;
        match gateway.upload(kind, original_name) {
            Ok(()) => {
                self.finish_upload(kind, Ok(original_name.to_string()));
                Ok(())
            }
            Err(err) => {
                self.finish_upload(kind, Err(err.clone()));
                Err(UploadError::Gateway(err))
            }
        }
    }

    /// Mark a kind as uploading. Split from [`finish_upload`] so callers
    /// driving uploads asynchronously can show the in-flight state.
    pub fn begin_upload(&mut self, kind: DocumentKind) -> Result<(), WizardLocked> {
        self.ensure_editable()?;
        self.uploads.insert(kind, UploadState::Uploading);
        Ok(())
    }

    /// Record an upload outcome for a kind, replacing any earlier marker.
    pub fn finish_upload(&mut self, kind: DocumentKind, outcome: Result<String, GatewayError>) {
        let state = match outcome {
            Ok(filename) => UploadState::Uploaded { filename },
            Err(err) => UploadState::Failed {
                reason: err.message,
            },
        };
        self.uploads.insert(kind, state);
    }

    pub fn upload_state(&self, kind: DocumentKind) -> Option<&UploadState> {
        self.uploads.get(&kind)
    }

    pub fn uploaded_filename(&self, kind: DocumentKind) -> Option<&str> {
        match self.uploads.get(&kind) {
            Some(UploadState::Uploaded { filename }) => Some(filename),
            _ => None,
        }
    }

    fn ensure_editable(&self) -> Result<(), WizardLocked> {
        match self.status {
            Some(status) if !status.is_editable() => Err(WizardLocked { status }),
            _ => Ok(()),
        }
    }
}
