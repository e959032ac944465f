use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use food_inspection::error::AppError;
use food_inspection::workflows::inspection::{
    aggregate_by_month, BranchFilter, MonthlyTrendPoint, VisitLedger,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;

#[derive(Debug, Deserialize)]
pub(crate) struct LedgerTrendRequest {
    pub(crate) visits_csv: String,
    #[serde(default)]
    pub(crate) year: Option<i32>,
    #[serde(default)]
    pub(crate) branch_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LedgerTrendResponse {
    pub(crate) visit_count: usize,
    pub(crate) points: Vec<MonthlyTrendPoint>,
}

/// Adds the health, readiness, metrics and ledger report endpoints to the inspection router.
pub(crate) fn with_operational_routes(router: Router) -> Router {
    router
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/reports/ledger-trend", post(ledger_trend_endpoint))
}

/// Monthly trend over an uploaded visit ledger, independent of the stored visits.
pub(crate) async fn ledger_trend_endpoint(
    Json(request): Json<LedgerTrendRequest>,
) -> Result<Json<LedgerTrendResponse>, AppError> {
    let visits = VisitLedger::from_reader(Cursor::new(request.visits_csv.into_bytes()))?;
    let filter = BranchFilter::from_query(request.branch_id.as_deref());
    let points = aggregate_by_month(&visits, request.year, &filter);

    Ok(Json(LedgerTrendResponse {
        visit_count: visits.len(),
        points,
    }))
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
    use crate::infra::{local_directory, seeded_service};
    use axum::body::Body;
    use axum::http::Request;
    use food_inspection::workflows::inspection::{inspection_router, ScoringConfig};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(ready: bool) -> Router {
        let service = seeded_service(ScoringConfig::default(), None).expect("service seeded");
        let identity = Arc::new(local_directory("local-admin", None));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_operational_routes(inspection_router(service, identity, Duration::from_secs(1)))
            .layer(Extension(state))
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let response = app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(true)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn seeded_catalog_is_served_next_to_health() {
        let router = app(true);

        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes");
        assert_eq!(health.status(), StatusCode::OK);

        let catalog = router
            .oneshot(
                Request::get("/api/v1/catalog")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(catalog.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(catalog.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("valid json");
        assert_eq!(payload["sections"].as_array().map(Vec::len), Some(5));
        assert_eq!(payload["active_items"], 13);
    }

    #[tokio::test]
    async fn ledger_trend_pools_scores_per_month() {
        let body = json!({
            "visits_csv": "branch_id,visit_date,total_score,max_possible_score\n\
                           centro,2025-01-05,80,100\n\
                           norte,2025-01-20,40,100\n\
                           centro,2025-02-02,,\n",
            "year": 2025,
        });
        let response = app(true)
            .oneshot(
                Request::post("/api/v1/reports/ledger-trend")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("valid json");
        assert_eq!(payload["visit_count"], 3);
        assert_eq!(payload["points"].as_array().map(Vec::len), Some(12));
        assert_eq!(payload["points"][0]["percentage"], 60);
        assert!(payload["points"][1]["percentage"].is_null());
    }

    #[tokio::test]
    async fn ledger_trend_rejects_malformed_dates() {
        let body = json!({
            "visits_csv": "branch_id,visit_date,total_score,max_possible_score\ncentro,05/01/2025,1,2\n",
        });
        let response = app(true)
            .oneshot(
                Request::post("/api/v1/reports/ledger-trend")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
