use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ChartError, ChartResult};
use crate::repair::RepairedSeries;

const DAY_MS: i64 = 86_400_000;

/// One chart row: a bucket start, its label, and one value per entity that
/// reported in the bucket. Absent keys mean "no data", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: i64,
    pub label: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

/// Renders bucket labels in a fixed display offset.
#[derive(Debug, Clone, Copy)]
pub struct LabelFormat {
    offset: FixedOffset,
}

impl Default for LabelFormat {
    fn default() -> Self {
        Self::utc()
    }
}

impl LabelFormat {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Offset east of UTC in minutes. Out-of-range offsets fall back to UTC.
    pub fn with_offset_minutes(minutes: i32) -> Self {
        match minutes.checked_mul(60).and_then(FixedOffset::east_opt) {
            Some(offset) => Self { offset },
            None => Self::utc(),
        }
    }

    /// `May 1 12:00` for intraday buckets, `May 1` for daily or wider.
    pub fn label(&self, bucket_ms: i64, width_ms: i64) -> String {
        let Some(dt) = DateTime::<Utc>::from_timestamp_millis(bucket_ms) else {
            return bucket_ms.to_string();
        };
        let local = dt.with_timezone(&self.offset);
        if width_ms >= DAY_MS {
            local.format("%b %-d").to_string()
        } else {
            local.format("%b %-d %H:%M").to_string()
        }
    }
}

/// Start of the epoch-aligned bucket containing `timestamp_ms`.
///
/// Floors toward negative infinity so pre-epoch instants stay left-closed.
/// Instants whose bucket start would fall below `i64::MIN` saturate there.
pub fn bucket_start(timestamp_ms: i64, width_ms: i64) -> i64 {
    timestamp_ms
        .div_euclid(width_ms)
        .checked_mul(width_ms)
        .unwrap_or(i64::MIN)
}

/// Last value per bucket of one series, skipping non-finite samples.
fn last_per_bucket(series: &RepairedSeries, width_ms: i64) -> BTreeMap<i64, f64> {
    let mut out = BTreeMap::new();
    for sample in &series.samples {
        if let Some(v) = sample.value.filter(|v| v.is_finite()) {
            out.insert(bucket_start(sample.timestamp_ms, width_ms), v);
        }
    }
    out
}

/// Merge repaired series into ascending rows, one per non-empty bucket.
///
/// Within a bucket the latest sample of each entity wins; there is no
/// averaging. Series that never had a valid value contribute nothing.
pub fn merge_buckets(
    series: &[RepairedSeries],
    width_ms: i64,
    labels: &LabelFormat,
) -> ChartResult<Vec<ChartPoint>> {
    if width_ms <= 0 {
        return Err(ChartError::InvalidBucketWidth);
    }

    let mut buckets: BTreeMap<i64, BTreeMap<String, f64>> = BTreeMap::new();
    for s in series.iter().filter(|s| s.is_plottable()) {
        for (bucket, v) in last_per_bucket(s, width_ms) {
            buckets
                .entry(bucket)
                .or_default()
                .insert(s.entity_id.clone(), v);
        }
    }

    Ok(buckets
        .into_iter()
        .map(|(timestamp, values)| ChartPoint {
            timestamp,
            label: labels.label(timestamp, width_ms),
            values,
        })
        .collect())
}

/// Attach `series` under `key` to rows that already exist.
///
/// Buckets where the series reported but no row exists are ignored, so an
/// overlay never adds rows of its own.
pub fn attach_series(
    rows: &mut [ChartPoint],
    key: &str,
    series: &RepairedSeries,
    width_ms: i64,
) -> ChartResult<()> {
    if width_ms <= 0 {
        return Err(ChartError::InvalidBucketWidth);
    }
    if !series.is_plottable() {
        return Ok(());
    }
    let values = last_per_bucket(series, width_ms);
    for row in rows.iter_mut() {
        if let Some(&v) = values.get(&row.timestamp) {
            row.values.insert(key.to_string(), v);
        }
    }
    Ok(())
}
