use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryApplicationRepository, InMemoryDocumentStore, InMemoryUserDirectory,
};
use crate::routes::with_onboarding_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use kyc_platform::auth::TokenSigner;
use kyc_platform::config::AppConfig;
use kyc_platform::error::AppError;
use kyc_platform::telemetry;
use kyc_platform::workflows::onboarding::OnboardingApi;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let store = Arc::new(InMemoryDocumentStore::default());
    let directory = Arc::new(InMemoryUserDirectory::default());
    let signer = TokenSigner::from_config(&config.auth);
    let api = Arc::new(OnboardingApi::new(repository, store, directory, signer));

    let app = with_onboarding_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "merchant onboarding service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
