use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryRecordStore, InMemoryScoreHistory};
use crate::routes::with_dashboard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use elitekpi::config::AppConfig;
use elitekpi::dashboard::{DashboardError, DashboardService};
use elitekpi::efficiency::EfficiencyEngine;
use elitekpi::error::AppError;
use elitekpi::records::RecordBundle;
use elitekpi::session::SessionPolicy;
use elitekpi::telemetry;
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

    let records = InMemoryRecordStore::default();
    if let Some(seed) = args.seed.take() {
        let bundles = RecordBundle::from_path(&seed)?;
        let users = records.load(bundles).map_err(DashboardError::from)?;
        info!(path = %seed.display(), users, "seeded record store");
    }

    let dashboard = Arc::new(DashboardService::new(
        Arc::new(records),
        Arc::new(InMemoryScoreHistory::default()),
        EfficiencyEngine::new(config.scoring.rules.clone()),
        config.scoring.lookback_days,
    ));

    let app = with_dashboard_routes(dashboard)
        .layer(Extension(SessionPolicy::new(config.session.dev_user.clone())))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        lookback_days = config.scoring.lookback_days,
        "efficiency dashboard ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
