use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use super::chart::now_ms;
use crate::state::AppState;

/// Build system sub-router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/api/health", get(api_health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/health — liveness plus a store round-trip.
async fn api_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let st = Arc::clone(&state);
    let db_ok = tokio::task::spawn_blocking(move || {
        st.pool
            .get()
            .ok()
            .and_then(|c| c.query_row("SELECT 1", [], |r| r.get::<_, i64>(0)).ok())
            .is_some()
    })
    .await
    .unwrap_or(false);

    Json(json!({
        "ok": db_ok,
        "now_ts_ms": now_ms(),
        "db_ok": db_ok,
    }))
}
