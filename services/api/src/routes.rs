use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use elitekpi::dashboard::{dashboard_router, DashboardService};
use elitekpi::efficiency::ScoreRecorder;
use elitekpi::records::RecordSource;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_dashboard_routes<S, R>(service: Arc<DashboardService<S, R>>) -> axum::Router
where
    S: RecordSource + 'static,
    R: ScoreRecorder + 'static,
{
    dashboard_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryRecordStore, InMemoryScoreHistory};
    use axum::body::Body;
    use axum::http::Request;
    use elitekpi::efficiency::EfficiencyEngine;
    use elitekpi::records::RecordBundle;
    use elitekpi::session::{SessionPolicy, USER_HEADER};
    use std::io::Cursor;
    use tower::ServiceExt;

    const BUNDLE: &str = r#"{
        "user_id": "agent-7",
        "properties": [
            { "id": 1, "status": "closed", "listing_date": "2025-05-01",
              "sold_date": "2025-05-21", "sold_price": 500000.0 },
            { "id": 2, "status": "listed", "listing_date": "2025-06-01" }
        ],
        "commissions": [ { "id": 1, "property_id": 1, "amount": 15000.0, "date_earned": "2025-05-25" } ],
        "expenses": [ { "id": 1, "category": "photography", "amount": 1000.0, "date": "2025-05-02" } ],
        "time_entries": [ { "id": 1, "property_id": 1, "hours": 24.0, "date": "2025-05-10" } ],
        "activity_actuals": [
            { "id": 1, "user_id": "agent-7", "date": "2025-06-28", "calls": 30 },
            { "id": 2, "user_id": "agent-7", "date": "2025-06-29", "calls": 25 }
        ]
    }"#;

    fn seeded_router(dev_user: Option<&str>) -> axum::Router {
        let store = InMemoryRecordStore::default();
        let bundles = RecordBundle::from_reader(Cursor::new(BUNDLE)).expect("bundle parses");
        store.load(bundles).expect("bundle loads");

        let service = Arc::new(DashboardService::new(
            Arc::new(store),
            Arc::new(InMemoryScoreHistory::default()),
            EfficiencyEngine::default(),
            7,
        ));
        with_dashboard_routes(service)
            .layer(Extension(SessionPolicy::new(dev_user.map(Into::into))))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn dashboard_metrics_served_for_dev_user() {
        let response = seeded_router(Some("agent-7"))
            .oneshot(
                Request::get("/api/v1/dashboard/metrics?today=2025-06-30")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        // 1 of 2 closed, 2 of 7 days tracked, 12h per listing, 20 days on market, 15x ROI
        assert_eq!(body["breakdown"]["conversionEfficiency"], 50);
        assert_eq!(body["breakdown"]["activityConsistency"], 60);
        assert_eq!(body["breakdown"]["timeManagement"], 90);
        assert_eq!(body["breakdown"]["dealVelocity"], 95);
        assert_eq!(body["breakdown"]["roiPerformance"], 95);
        assert_eq!(body["overallScore"], 76);
    }

    async fn get(router: &axum::Router, uri: &str) -> axum::response::Response {
        router
            .clone()
            .oneshot(
                Request::get(uri)
                    .header(USER_HEADER, "agent-7")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds")
    }

    #[tokio::test]
    async fn repeated_polling_keeps_one_history_row_for_today() {
        let router = seeded_router(None);

        for _ in 0..5 {
            let response = get(&router, "/api/v1/dashboard/metrics?today=2099-12-31").await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        let far_future = get(
            &router,
            "/api/v1/dashboard/efficiency-history?days=1&today=2099-12-31",
        )
        .await;
        let body = body_json(far_future).await;
        assert_eq!(body["history"].as_array().map(Vec::len), Some(0));

        for _ in 0..3 {
            let response = get(&router, "/api/v1/dashboard/metrics").await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        let recent = get(&router, "/api/v1/dashboard/efficiency-history?days=2").await;
        let body = body_json(recent).await;
        assert_eq!(body["history"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn dashboard_metrics_reject_bad_window() {
        let response = seeded_router(None)
            .oneshot(
                Request::get("/api/v1/dashboard/metrics?daysBack=0")
                    .header(USER_HEADER, "agent-7")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_user_gets_new_user_scores() {
        let response = seeded_router(None)
            .oneshot(
                Request::get("/api/v1/dashboard/metrics")
                    .header(USER_HEADER, "someone-else")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["overallScore"], 0);
        assert_eq!(body["rating"], "not_started");
    }
}
