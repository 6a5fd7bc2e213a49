use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chart_core::{ingest, RawSample, RawValue};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::db::{prices, snapshots};
use crate::error::HubError;
use crate::state::AppState;

/// Upper bound on samples accepted per webhook call.
const MAX_BATCH: usize = 5_000;

#[derive(Debug, Deserialize)]
pub struct SnapshotIn {
    agent_id: String,
    timestamp: String,
    #[serde(default)]
    total_value: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
pub struct PortfolioWebhook {
    snapshots: Vec<SnapshotIn>,
}

#[derive(Debug, Deserialize)]
pub struct PriceIn {
    timestamp: String,
    #[serde(default)]
    price: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
pub struct PricesWebhook {
    #[serde(default)]
    symbol: Option<String>,
    prices: Vec<PriceIn>,
}

/// Webhook sub-router. Callers wrap it in the shared-secret middleware.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/webhooks/portfolio", post(webhook_portfolio))
        .route("/api/webhooks/prices", post(webhook_prices))
}

fn check_batch(len: usize) -> Result<(), HubError> {
    if len > MAX_BATCH {
        return Err(HubError::BadRequest(format!(
            "batch too large: {len} > {MAX_BATCH}"
        )));
    }
    Ok(())
}

/// POST /api/webhooks/portfolio — append agent valuations.
///
/// The whole batch is rejected if any row has a malformed timestamp or a
/// non-numeric value; null values are stored and repaired at read time.
async fn webhook_portfolio(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PortfolioWebhook>,
) -> Result<Json<Value>, HubError> {
    check_batch(body.snapshots.len())?;

    let raw = body
        .snapshots
        .into_iter()
        .map(|s| RawSample {
            entity_id: s.agent_id.trim().to_string(),
            timestamp: s.timestamp,
            value: s.total_value,
        })
        .collect();
    let samples = ingest(raw).map_err(|e| HubError::BadRequest(e.to_string()))?;

    let st = Arc::clone(&state);
    let inserted = tokio::task::spawn_blocking(move || {
        let mut conn = st.pool.get()?;
        snapshots::insert_portfolio_samples(&mut conn, &samples)
    })
    .await??;

    state.chart_cache.invalidate().await;
    tracing::info!(inserted, "portfolio snapshots stored");
    Ok(Json(json!({ "ok": true, "inserted": inserted })))
}

/// POST /api/webhooks/prices — append reference prices for the baseline.
async fn webhook_prices(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PricesWebhook>,
) -> Result<Json<Value>, HubError> {
    check_batch(body.prices.len())?;

    let symbol = body
        .symbol
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| state.config.baseline_symbol.clone());

    let raw = body
        .prices
        .into_iter()
        .map(|p| RawSample {
            entity_id: symbol.clone(),
            timestamp: p.timestamp,
            value: p.price,
        })
        .collect();
    let points: Vec<(i64, Option<f64>)> = ingest(raw)
        .map_err(|e| HubError::BadRequest(e.to_string()))?
        .into_iter()
        .map(|s| (s.timestamp_ms, s.value))
        .collect();

    let st = Arc::clone(&state);
    let sym = symbol.clone();
    let inserted = tokio::task::spawn_blocking(move || {
        let mut conn = st.pool.get()?;
        prices::insert_reference_prices(&mut conn, &sym, &points)
    })
    .await??;

    state.chart_cache.invalidate().await;
    tracing::info!(inserted, symbol = %symbol, "reference prices stored");
    Ok(Json(json!({ "ok": true, "inserted": inserted, "symbol": symbol })))
}
