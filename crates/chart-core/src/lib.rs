//! Chart series for agent portfolio valuations.
//!
//! Raw snapshots arrive irregularly and sometimes read zero when an upstream
//! balance call fails. This crate repairs each agent's series (forward-fill,
//! then back-fill of any leading gap), buckets the result on an epoch-aligned
//! grid and merges all agents plus an optional buy-and-hold baseline into one
//! row per bucket.
//!
//! Everything here is pure and synchronous: no I/O, no logging, no shared
//! state.

pub mod baseline;
pub mod bucket;
pub mod error;
pub mod range;
pub mod repair;
pub mod sample;

pub use baseline::{build_baseline, BaselineSpec};
pub use bucket::{attach_series, bucket_start, merge_buckets, ChartPoint, LabelFormat};
pub use error::{ChartError, ChartResult};
pub use range::{RangeSpec, RangeTable, RangeTier};
pub use repair::{repair_by_entity, repair_series, repair_series_with, RepairedSeries};
pub use sample::{
    check_entity_id, ingest, is_valid_value, parse_timestamp_ms, RawSample, RawValue, Sample,
    BASELINE_KEY,
};

/// Everything needed to build one chart.
#[derive(Debug, Clone)]
pub struct ChartInput {
    /// Agent samples for the window, any order, any mix of entities.
    pub samples: Vec<Sample>,
    /// Reference price samples for the window. `None` when the price fetch
    /// failed or no baseline is configured.
    pub baseline_prices: Option<Vec<Sample>>,
    pub baseline: BaselineSpec,
    pub bucket_width_ms: i64,
    pub labels: LabelFormat,
}

/// Repair, bucket and merge samples into ascending chart rows.
///
/// Rows come only from agent data. The baseline is attached to buckets that
/// already have a row, so with no plottable agent the result is empty.
pub fn build_chart(input: ChartInput) -> ChartResult<Vec<ChartPoint>> {
    if input.bucket_width_ms <= 0 {
        return Err(ChartError::InvalidBucketWidth);
    }

    let mut series = repair_by_entity(input.samples);
    for s in &series {
        check_entity_id(&s.entity_id)?;
    }
    series.retain(RepairedSeries::is_plottable);
    if series.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows = merge_buckets(&series, input.bucket_width_ms, &input.labels)?;
    if let Some(prices) = input.baseline_prices {
        let baseline = build_baseline(prices, input.baseline);
        if !baseline.is_empty() {
            attach_series(
                &mut rows,
                BASELINE_KEY,
                &repair_series(baseline),
                input.bucket_width_ms,
            )?;
        }
    }
    Ok(rows)
}

/// [`build_chart`] for untyped input; fails on the first malformed sample.
pub fn build_chart_from_raw(
    raw: Vec<RawSample>,
    baseline_prices: Option<Vec<Sample>>,
    baseline: BaselineSpec,
    range: &RangeSpec,
    labels: LabelFormat,
) -> ChartResult<Vec<ChartPoint>> {
    let samples = ingest(raw)?;
    build_chart(ChartInput {
        samples,
        baseline_prices,
        baseline,
        bucket_width_ms: range.bucket_width_ms(),
        labels,
    })
}
