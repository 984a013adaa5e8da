use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::service::{DashboardError, DashboardService};
use crate::efficiency::ScoreRecorder;
use crate::records::RecordSource;
use crate::session::SessionUser;

const DEFAULT_HISTORY_DAYS: u32 = 30;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    #[serde(default)]
    pub days_back: Option<u32>,
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub days: Option<u32>,
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// Router exposing the dashboard efficiency endpoints.
pub fn dashboard_router<S, R>(service: Arc<DashboardService<S, R>>) -> Router
where
    S: RecordSource + 'static,
    R: ScoreRecorder + 'static,
{
    Router::new()
        .route("/api/v1/dashboard/metrics", get(metrics_handler::<S, R>))
        .route(
            "/api/v1/dashboard/efficiency-history",
            get(history_handler::<S, R>),
        )
        .with_state(service)
}

pub(crate) async fn metrics_handler<S, R>(
    State(service): State<Arc<DashboardService<S, R>>>,
    SessionUser(user): SessionUser,
    Query(query): Query<MetricsQuery>,
) -> Response
where
    S: RecordSource + 'static,
    R: ScoreRecorder + 'static,
{
    // History is only written under the server's date; other dates are what-ifs.
    let today = Local::now().date_naive();
    let result = match query.today.filter(|as_of| *as_of != today) {
        Some(as_of) => service.preview_metrics(&user, as_of, query.days_back).await,
        None => service.efficiency_metrics(&user, today, query.days_back).await,
    };
    match result {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn history_handler<S, R>(
    State(service): State<Arc<DashboardService<S, R>>>,
    SessionUser(user): SessionUser,
    Query(query): Query<HistoryQuery>,
) -> Response
where
    S: RecordSource + 'static,
    R: ScoreRecorder + 'static,
{
    let today = query.today.unwrap_or_else(|| Local::now().date_naive());
    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    match service.score_history(&user, today, days).await {
        Ok(history) => {
            let payload = json!({
                "userId": user,
                "days": days,
                "history": history,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: DashboardError) -> Response {
    let status = match err {
        DashboardError::InvalidWindow(_) => StatusCode::BAD_REQUEST,
        DashboardError::Source(_) | DashboardError::History(_) => {
            tracing::error!(error = %err, "dashboard request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
