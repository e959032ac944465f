use crate::cli::ServeArgs;
use crate::infra::{local_directory, seeded_service, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use food_inspection::config::AppConfig;
use food_inspection::error::AppError;
use food_inspection::telemetry;
use food_inspection::workflows::inspection::inspection_router;
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

    let service = seeded_service(config.scoring, args.catalog.as_deref())?;
    let identity = Arc::new(local_directory(
        &args.admin_token,
        args.employee_token.as_deref(),
    ));

    let app = with_operational_routes(inspection_router(
        service,
        identity,
        config.access.resolution_timeout,
    ))
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "inspection tracker ready");

    axum::serve(listener, app).await?;
    Ok(())
}
