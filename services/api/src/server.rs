use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryResultStore};
use crate::routes::with_import_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use exam_results::config::AppConfig;
use exam_results::error::AppError;
use exam_results::telemetry;
use exam_results::workflows::result_import::{ResultCollection, ResultImportService};
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

    let exam_results = Arc::new(ResultImportService::new(
        ResultCollection::ExamResults,
        Arc::new(InMemoryResultStore::default()),
        config.import,
    ));
    let competitive_results = Arc::new(ResultImportService::new(
        ResultCollection::CompetitiveExamResults,
        Arc::new(InMemoryResultStore::default()),
        config.import,
    ));

    let app = with_import_routes(exam_results, competitive_results)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_upload_bytes = config.import.max_upload_bytes,
        batch_size = config.import.batch_size.get(),
        "result import service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
