use crate::cli::ServeArgs;
use crate::infra::{availability_policy, demo_collaborators, AppState};
use crate::routes::with_availability_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use visit_availability::config::AppConfig;
use visit_availability::error::AppError;
use visit_availability::telemetry;
use visit_availability::workflows::visits::availability::AvailabilityService;

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

    // Real HTTP collaborator clients live outside this service; the bundled
    // fixture world keeps the engine exercisable end to end.
    let collaborators = demo_collaborators(Local::now().date_naive());
    let service = Arc::new(AvailabilityService::new(
        collaborators,
        availability_policy(&config.booking),
    ));

    let app = with_availability_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "visit session availability service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
