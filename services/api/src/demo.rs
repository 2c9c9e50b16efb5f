use crate::infra::{
    InMemoryApplicationRepository, InMemoryDocumentStore, InMemoryUserDirectory,
};
use clap::Args;
use kyc_platform::auth::{AuthService, RegisterRequest, Role, TokenSigner};
use kyc_platform::config::AuthConfig;
use kyc_platform::error::AppError;
use kyc_platform::workflows::onboarding::wizard::Field;
use kyc_platform::workflows::onboarding::{
    ApplicationGateway, ApplicationId, ApplicationStatus, BusinessProfile, DocumentKind,
    GatewayError, MerchantId, MerchantOnboardingService, OnboardingWizard, ReviewConsoleService,
    ReviewDecision, ReviewRequest, WizardStep,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Review decision applied to the submitted demo application
    #[arg(long, default_value = "approved", value_parser = parse_decision)]
    pub(crate) decision: ReviewDecision,
    /// Reviewer comment attached to the decision
    #[arg(long)]
    pub(crate) comment: Option<String>,
    /// Stop after submission, skipping the review portion
    #[arg(long)]
    pub(crate) skip_review: bool,
}

fn parse_decision(raw: &str) -> Result<ReviewDecision, String> {
    match raw {
        "approved" => Ok(ReviewDecision::Approved),
        "rejected" => Ok(ReviewDecision::Rejected),
        "needs_more_docs" => Ok(ReviewDecision::NeedsMoreDocs),
        other => Err(format!(
            "'{other}' is not a decision (approved | rejected | needs_more_docs)"
        )),
    }
}

/// Gateway adapter wiring the wizard straight to the merchant service.
struct ServiceGateway {
    service: Arc<MerchantOnboardingService<InMemoryApplicationRepository, InMemoryDocumentStore>>,
    merchant: MerchantId,
}

impl ApplicationGateway for ServiceGateway {
    fn save(&mut self, profile: &BusinessProfile) -> Result<ApplicationId, GatewayError> {
        self.service
            .save_draft(&self.merchant, profile.clone())
            .map(|record| record.id)
            .map_err(|err| GatewayError::new(err.to_string()))
    }

    fn submit(&mut self) -> Result<(), GatewayError> {
        self.service
            .submit(&self.merchant)
            .map(|_| ())
            .map_err(|err| GatewayError::new(err.to_string()))
    }

    fn upload(&mut self, kind: DocumentKind, original_name: &str) -> Result<(), GatewayError> {
        let content_type = mime_guess::from_path(original_name)
            .first_or_octet_stream()
            .to_string();
        self.service
            .attach_document(
                &self.merchant,
                kind,
                original_name,
                &content_type,
                b"demo document body".to_vec(),
            )
            .map(|_| ())
            .map_err(|err| GatewayError::new(err.to_string()))
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    println!("Merchant onboarding demo");

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let store = Arc::new(InMemoryDocumentStore::default());
    let directory = Arc::new(InMemoryUserDirectory::default());
    let signer = TokenSigner::from_config(&AuthConfig {
        jwt_secret: "demo-secret".to_string(),
        token_ttl_hours: 24,
    });
    let auth = AuthService::new(directory.clone(), signer);

    let merchant_account = match auth.register(RegisterRequest {
        email: "amira@falcon.example".to_string(),
        password: "correct horse battery".to_string(),
        full_name: "Amira Hassan".to_string(),
        role: Role::Merchant,
    }) {
        Ok(issued) => {
            println!("- Registered merchant amira@falcon.example ({})", issued.role);
            auth.authorize(&issued.token)
        }
        Err(err) => {
            println!("  Registration failed: {err}");
            return Ok(());
        }
    };
    let merchant = match merchant_account {
        Ok(session) => MerchantId(session.user_id),
        Err(err) => {
            println!("  Token rejected: {err}");
            return Ok(());
        }
    };

    let service = Arc::new(MerchantOnboardingService::new(
        repository.clone(),
        store.clone(),
    ));
    let review = ReviewConsoleService::new(repository.clone(), directory.clone());
    let mut gateway = ServiceGateway {
        service: service.clone(),
        merchant: merchant.clone(),
    };

    // An advance attempt on the empty form surfaces every step error at once.
    let mut wizard = OnboardingWizard::new();
    if let Err(err) = wizard.advance(&mut gateway) {
        if let kyc_platform::workflows::onboarding::wizard::AdvanceError::Validation(issues) = err {
            println!("- Step 1 blocked with {} field errors, for example:", issues.len());
            for issue in issues.iter().take(3) {
                println!("    {}", issue.message);
            }
        }
    }

    let business_fields = [
        (Field::BusinessName, "Falcon Trading LLC"),
        (Field::BusinessCategory, "Retail"),
        (Field::BusinessSubcategory, "Electronics"),
        (Field::Country, "United Arab Emirates"),
        (Field::Website, "https://falcon.example"),
        (Field::BusinessDescription, "Consumer electronics storefront"),
        (Field::MonthlyVolume, "85 000"),
    ];
    let contact_fields = [
        (Field::OwnerName, "Amira Hassan"),
        (Field::ContactPhone, "+971 50 000 0000"),
        (Field::ContactAddress, "12 Marina Walk, Dubai"),
    ];

    for (field, value) in business_fields {
        if wizard.set_field(field, value).is_err() {
            println!("  Form unexpectedly locked");
            return Ok(());
        }
    }
    println!(
        "- Monthly volume stored as '{}', displayed as '{}'",
        wizard.profile().monthly_volume,
        wizard.volume_display()
    );

    if let Err(err) = wizard.advance(&mut gateway) {
        println!("  Business step failed: {err}");
        return Ok(());
    }
    println!("- Business step saved, wizard at {}", wizard.step().label());

    for (field, value) in contact_fields {
        if wizard.set_field(field, value).is_err() {
            println!("  Form unexpectedly locked");
            return Ok(());
        }
    }
    if let Err(err) = wizard.advance(&mut gateway) {
        println!("  Contact step failed: {err}");
        return Ok(());
    }

    for (kind, name) in [
        (DocumentKind::BusinessLicense, "trade-license.pdf"),
        (DocumentKind::MemorandumOfAssociation, "moa.pdf"),
    ] {
        match wizard.upload(&mut gateway, kind, name) {
            Ok(()) => println!("- Uploaded {} as {}", name, kind.label()),
            Err(err) => println!("  Upload of {name} failed: {err}"),
        }
    }

    if let Err(err) = wizard.advance(&mut gateway) {
        println!("  Documents step failed: {err}");
        return Ok(());
    }
    if let Err(err) = wizard.submit(&mut gateway) {
        println!("  Submission failed: {err}");
        return Ok(());
    }
    println!(
        "- Application submitted, status {}",
        ApplicationStatus::Pending.label()
    );

    if args.skip_review {
        return Ok(());
    }

    let pending = match review.list(Some(ApplicationStatus::Pending)) {
        Ok(rows) => rows,
        Err(err) => {
            println!("  Review queue unavailable: {err}");
            return Ok(());
        }
    };
    println!("\nReview queue ({} pending)", pending.len());
    for row in &pending {
        println!(
            "- {} | {} <{}> | {}",
            row.business_name,
            row.merchant_name,
            row.email,
            row.status.label()
        );
    }

    let Some(first) = pending.first() else {
        return Ok(());
    };
    let decided = match review.decide(
        &first.id,
        "reviewer-demo",
        ReviewRequest {
            status: args.decision,
            comment: args.comment,
        },
    ) {
        Ok(record) => record,
        Err(err) => {
            println!("  Decision failed: {err}");
            return Ok(());
        }
    };
    println!(
        "\nDecision recorded: {}",
        decided.status().label()
    );
    if let Some(comment) = decided.reviewer_comment() {
        println!("  Comment: {comment}");
    }

    // What the merchant sees on reload.
    let wizard = OnboardingWizard::resume(&decided);
    println!(
        "Merchant reload: wizard opens at {} ({})",
        wizard.step().label(),
        if wizard.can_edit() {
            "editable"
        } else {
            "read-only"
        }
    );
    if wizard.step() != WizardStep::Submit {
        println!("  Merchant can edit and resubmit");
    }

    println!("\nStatus history");
    for change in repository.history() {
        println!(
            "- {} -> {} by {}",
            change.old_status, change.new_status, change.changed_by
        );
    }

    Ok(())
}
