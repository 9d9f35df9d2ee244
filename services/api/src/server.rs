use crate::cli::ServeArgs;
use crate::infra::{seeded_store, AppState};
use crate::routes::with_feedback_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use booking_feedback::config::AppConfig;
use booking_feedback::error::AppError;
use booking_feedback::feedback::FeedbackService;
use booking_feedback::telemetry;
use chrono::Utc;
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

    let store = Arc::new(seeded_store(Utc::now(), &config.feedback.admin_role));
    let feedback_service = Arc::new(FeedbackService::new(store, config.feedback.clone()));

    let app = with_feedback_routes(feedback_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        completion_buffer_hours = config.feedback.completion_buffer_hours,
        "booking feedback service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
