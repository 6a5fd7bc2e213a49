use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Output key carrying the bucket start instant.
pub const TIMESTAMP_KEY: &str = "timestamp";
/// Output key carrying the human-readable bucket label.
pub const LABEL_KEY: &str = "label";
/// Output key for the synthetic reference series.
pub const BASELINE_KEY: &str = "baseline";

const RESERVED_KEYS: &[&str] = &[TIMESTAMP_KEY, LABEL_KEY, BASELINE_KEY];

// ── Types ────────────────────────────────────────────────────────────────

/// One observation of one entity's valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub entity_id: String,
    pub timestamp_ms: i64,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(entity_id: impl Into<String>, timestamp_ms: i64, value: Option<f64>) -> Self {
        Self {
            entity_id: entity_id.into(),
            timestamp_ms,
            value,
        }
    }

    pub fn is_valid(&self) -> bool {
        is_valid_value(self.value)
    }
}

/// Value as it arrives from the store or a webhook body: a JSON number or a
/// numeric string (Postgres `numeric` columns serialise as strings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

/// An unvalidated sample with a textual timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub entity_id: String,
    pub timestamp: String,
    #[serde(default)]
    pub value: Option<RawValue>,
}

// ── Validity ─────────────────────────────────────────────────────────────

/// Whether a valuation is usable.
///
/// Agents always hold a non-zero balance, so a zero reading is an upstream
/// measurement failure, not a real value. Absent and non-finite readings are
/// failures too.
pub fn is_valid_value(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v.is_finite() && v != 0.0)
}

/// Reject entity ids that would shadow a fixed output key.
pub fn check_entity_id(entity_id: &str) -> ChartResult<()> {
    let trimmed = entity_id.trim();
    if trimmed.is_empty() {
        return Err(ChartError::EmptyEntityId);
    }
    if RESERVED_KEYS.contains(&trimmed) {
        return Err(ChartError::ReservedEntityId(entity_id.to_string()));
    }
    Ok(())
}

// ── Parsing ──────────────────────────────────────────────────────────────

/// Parse a timestamp into epoch milliseconds.
///
/// Accepts RFC 3339, Postgres text output (`2024-05-01 12:00:00.123+00`) and
/// naive ISO-8601, the latter read as UTC.
pub fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    None
}

fn parse_value(entity_id: &str, raw: Option<RawValue>) -> ChartResult<Option<f64>> {
    match raw {
        None => Ok(None),
        Some(RawValue::Number(v)) => Ok(Some(v)),
        Some(RawValue::Text(s)) => {
            let t = s.trim();
            if t.is_empty() {
                return Ok(None);
            }
            t.parse::<f64>()
                .map(Some)
                .map_err(|_| ChartError::NonNumericValue {
                    entity_id: entity_id.to_string(),
                    raw: s,
                })
        }
    }
}

/// Validate raw samples into typed ones.
///
/// Missing values pass through as `None`; they are repaired later. Any
/// malformed timestamp or non-numeric value fails the whole batch.
pub fn ingest(raw: Vec<RawSample>) -> ChartResult<Vec<Sample>> {
    raw.into_iter()
        .map(|r| {
            check_entity_id(&r.entity_id)?;
            let timestamp_ms =
                parse_timestamp_ms(&r.timestamp).ok_or_else(|| ChartError::InvalidTimestamp {
                    entity_id: r.entity_id.clone(),
                    raw: r.timestamp.clone(),
                })?;
            let value = parse_value(&r.entity_id, r.value)?;
            Ok(Sample {
                entity_id: r.entity_id,
                timestamp_ms,
                value,
            })
        })
        .collect()
}
