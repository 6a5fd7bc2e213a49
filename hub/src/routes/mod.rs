pub mod chart;
pub mod system;
pub mod webhooks;

use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth;
use crate::state::AppState;

/// Assemble the full router. Webhook routes sit behind the shared secret;
/// read routes are open.
pub fn app(state: Arc<AppState>) -> Router {
    let webhooks = webhooks::routes().route_layer(middleware::from_fn_with_state(
        Arc::clone(&state),
        auth::require_webhook_secret,
    ));

    Router::new()
        .merge(system::routes())
        .merge(chart::routes())
        .merge(webhooks)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::WEBHOOK_SECRET_HEADER;
    use crate::config::HubConfig;
    use crate::db::pool::testing::{cleanup, tmp_db_path};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, secret: Option<&str>, body: &str) -> Request<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(s) = secret {
            req = req.header(WEBHOOK_SECRET_HEADER, s);
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn test_state(tag: &str, secret: &str) -> (Arc<AppState>, std::path::PathBuf) {
        let path = tmp_db_path(tag);
        let mut cfg = HubConfig::for_tests(path.clone());
        cfg.webhook_secret = secret.to_string();
        (AppState::new(cfg).unwrap(), path)
    }

    const SNAPSHOTS: &str = r#"{"snapshots": [
        {"agent_id": "alpha", "timestamp": "2024-05-01T12:00:10Z", "total_value": 10000},
        {"agent_id": "alpha", "timestamp": "2024-05-01T12:01:10Z", "total_value": 0},
        {"agent_id": "beta",  "timestamp": "2024-05-01T12:00:20Z", "total_value": null},
        {"agent_id": "beta",  "timestamp": "2024-05-01T12:01:20Z", "total_value": "9500.5"}
    ]}"#;

    #[tokio::test]
    async fn health_endpoints_respond() {
        let (state, path) = test_state("health", "s3cret");
        let app = app(state);

        let resp = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app.oneshot(get("/api/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["db_ok"], true);
        cleanup(&path);
    }

    #[tokio::test]
    async fn webhook_requires_matching_secret() {
        let (state, path) = test_state("auth", "s3cret");
        let app = app(state);

        let resp = app
            .clone()
            .oneshot(post_json("/api/webhooks/portfolio", None, SNAPSHOTS))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = app
            .clone()
            .oneshot(post_json("/api/webhooks/portfolio", Some("wrong"), SNAPSHOTS))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = app
            .oneshot(post_json("/api/webhooks/portfolio", Some("s3cret"), SNAPSHOTS))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["inserted"], 4);
        cleanup(&path);
    }

    #[tokio::test]
    async fn empty_secret_disables_webhooks() {
        let (state, path) = test_state("disabled", "");
        let resp = app(state)
            .oneshot(post_json("/api/webhooks/portfolio", Some(""), SNAPSHOTS))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        cleanup(&path);
    }

    #[tokio::test]
    async fn malformed_webhook_rows_are_rejected_whole() {
        let (state, path) = test_state("malformed", "s3cret");
        let app = app(state);

        let body = r#"{"snapshots": [
            {"agent_id": "alpha", "timestamp": "2024-05-01T12:00:00Z", "total_value": 1},
            {"agent_id": "alpha", "timestamp": "whenever", "total_value": 2}
        ]}"#;
        let resp = app
            .clone()
            .oneshot(post_json("/api/webhooks/portfolio", Some("s3cret"), body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = r#"{"snapshots": [
            {"agent_id": "label", "timestamp": "2024-05-01T12:00:00Z", "total_value": 1}
        ]}"#;
        let resp = app
            .clone()
            .oneshot(post_json("/api/webhooks/portfolio", Some("s3cret"), body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app.oneshot(get("/api/chart?range=all")).await.unwrap();
        assert_eq!(body_json(resp).await, serde_json::json!([]));
        cleanup(&path);
    }

    #[tokio::test]
    async fn chart_endpoint_serves_repaired_rows() {
        let (state, path) = test_state("chart_e2e", "s3cret");
        let app = app(state);

        let resp = app.clone().oneshot(get("/api/chart?range=ALL")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, serde_json::json!([]));

        let resp = app
            .clone()
            .oneshot(post_json("/api/webhooks/portfolio", Some("s3cret"), SNAPSHOTS))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let prices = r#"{"prices": [
            {"timestamp": "2024-05-01T12:00:00Z", "price": 50000},
            {"timestamp": "2024-05-01T12:01:00Z", "price": 0}
        ]}"#;
        let resp = app
            .clone()
            .oneshot(post_json("/api/webhooks/prices", Some("s3cret"), prices))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["symbol"], "BTC");

        let resp = app.oneshot(get("/api/chart?range=all")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=60"
        );
        let rows = body_json(resp).await;
        let rows = rows.as_array().unwrap();
        // ALL buckets are four hours wide; everything lands in one bucket.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["alpha"], 10000.0);
        assert_eq!(rows[0]["beta"], 9500.5);
        assert_eq!(rows[0]["baseline"], 10000.0);
        cleanup(&path);
    }

    #[tokio::test]
    async fn ranges_endpoint_lists_tiers() {
        let (state, path) = test_state("ranges_e2e", "s3cret");
        let resp = app(state).oneshot(get("/api/ranges")).await.unwrap();
        let specs = body_json(resp).await;
        assert_eq!(specs[0]["tier"], "24H");
        assert_eq!(specs[0]["bucket_minutes"], 1);
        assert_eq!(specs.as_array().unwrap().len(), 5);
        cleanup(&path);
    }
}
