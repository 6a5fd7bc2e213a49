use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chart_core::{build_chart, ChartInput, ChartPoint, RangeSpec, Sample};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::{prices, snapshots};
use crate::error::HubError;
use crate::state::AppState;

pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    range: Option<String>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chart", get(api_chart))
        .route("/api/ranges", get(api_ranges))
}

/// GET /api/chart?range=24h — bucketed portfolio values for every agent.
async fn api_chart(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ChartQuery>,
) -> Result<Response, HubError> {
    let spec = state.ranges.resolve(q.range.as_deref());
    let rows = chart_rows(&state, spec, now_ms()).await?;

    let cache_control = format!("public, max-age={}", state.chart_cache.ttl().as_secs());
    Ok(([(header::CACHE_CONTROL, cache_control)], Json(rows.as_slice())).into_response())
}

/// GET /api/ranges — the tier table, default first.
async fn api_ranges(State(state): State<Arc<AppState>>) -> Json<Vec<RangeSpec>> {
    let default = state.ranges.default_spec();
    let mut specs = vec![default];
    specs.extend(state.ranges.specs().filter(|s| s.tier != default.tier));
    Json(specs)
}

/// Resolve chart rows for a range, from cache when fresh.
pub(crate) async fn chart_rows(
    state: &Arc<AppState>,
    spec: RangeSpec,
    now_ms: i64,
) -> Result<Arc<Vec<ChartPoint>>, HubError> {
    if let Some(rows) = state.chart_cache.get(spec.tier).await {
        return Ok(rows);
    }

    let generation = state.chart_cache.generation();
    let rows = Arc::new(build_rows(state, spec, now_ms).await?);
    if !state
        .chart_cache
        .put(spec.tier, Arc::clone(&rows), generation)
        .await
    {
        tracing::debug!(tier = spec.tier.as_str(), "chart not cached");
    }
    Ok(rows)
}

/// Read the window from the store and build rows, bypassing the cache.
async fn build_rows(
    state: &Arc<AppState>,
    spec: RangeSpec,
    now_ms: i64,
) -> Result<Vec<ChartPoint>, HubError> {
    let since_ms = spec.since_ms(now_ms);
    let (samples, baseline_prices) = tokio::join!(
        load_samples(Arc::clone(state), since_ms),
        load_baseline(Arc::clone(state), since_ms),
    );
    let samples = samples?;

    let rows = build_chart(ChartInput {
        samples,
        baseline_prices,
        baseline: state.config.baseline_spec(),
        bucket_width_ms: spec.bucket_width_ms(),
        labels: state.config.label_format(),
    })?;
    tracing::debug!(
        tier = spec.tier.as_str(),
        rows = rows.len(),
        "chart built"
    );
    Ok(rows)
}

async fn load_samples(
    state: Arc<AppState>,
    since_ms: Option<i64>,
) -> Result<Vec<Sample>, HubError> {
    tokio::task::spawn_blocking(move || {
        let conn = state.pool.get()?;
        snapshots::fetch_portfolio_samples(&conn, since_ms)
    })
    .await?
}

/// Baseline prices are optional: any failure degrades to "no baseline".
async fn load_baseline(state: Arc<AppState>, since_ms: Option<i64>) -> Option<Vec<Sample>> {
    let result = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get()?;
        prices::fetch_reference_prices(&conn, &state.config.baseline_symbol, since_ms)
    })
    .await
    .map_err(HubError::from)
    .and_then(|r| r);

    match result {
        Ok(prices) => Some(prices),
        Err(e) => {
            tracing::warn!("baseline prices unavailable, charting without baseline: {e}");
            None
        }
    }
}
