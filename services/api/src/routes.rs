use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use interview_hub::http::{hub_router, HubState};
use serde_json::json;
use std::sync::atomic::Ordering;

/// Health, readiness and metrics endpoints plus the hiring API under `/api/v1`.
pub(crate) fn service_router(hub: HubState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .merge(hub_router(hub))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
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
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Duration;
    use interview_hub::auth::TokenIssuer;
    use interview_hub::hiring::activity::ActivityLog;
    use interview_hub::store::Store;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(ready: bool) -> Router {
        let hub = HubState::new(
            Arc::new(Store::new()),
            Arc::new(TokenIssuer::new(
                "routes-test-secret",
                Duration::minutes(5),
                Duration::hours(1),
            )),
            ActivityLog::default(),
        );
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        service_router(hub).layer(Extension(state))
    }

    async fn status_of(router: Router, uri: &str) -> StatusCode {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response")
            .status()
    }

    #[tokio::test]
    async fn health_and_readiness_endpoints_report_state() {
        assert_eq!(status_of(app(false), "/health").await, StatusCode::OK);
        assert_eq!(
            status_of(app(false), "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_of(app(true), "/ready").await, StatusCode::OK);
        assert_eq!(status_of(app(true), "/metrics").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn hiring_api_is_mounted_behind_authentication() {
        assert_eq!(
            status_of(app(true), "/api/v1/companies").await,
            StatusCode::UNAUTHORIZED
        );
    }
}
