use std::collections::BTreeMap;

use crate::sample::{is_valid_value, Sample};

/// One entity's samples after forward/back-fill.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairedSeries {
    pub entity_id: String,
    /// Same length as the input, sorted by timestamp.
    pub samples: Vec<Sample>,
    /// Gaps replaced by the previous valid value.
    pub filled: usize,
    /// Leading gaps replaced by the first valid value.
    pub backfilled: usize,
    plottable: bool,
}

impl RepairedSeries {
    /// False when the entity never reported a valid value in the window.
    /// Such series stay unrepaired and must not be charted.
    pub fn is_plottable(&self) -> bool {
        self.plottable
    }
}

/// Repair a single entity's series with the default validity rule.
pub fn repair_series(samples: Vec<Sample>) -> RepairedSeries {
    repair_series_with(samples, is_valid_value)
}

/// Repair a single entity's series.
///
/// All samples are expected to belong to the same entity; the id of the
/// first sample names the result.
pub fn repair_series_with(
    mut samples: Vec<Sample>,
    is_valid: impl Fn(Option<f64>) -> bool,
) -> RepairedSeries {
    let entity_id = samples
        .first()
        .map(|s| s.entity_id.clone())
        .unwrap_or_default();

    // Stable: equal timestamps keep arrival order.
    samples.sort_by_key(|s| s.timestamp_ms);

    let mut filled = 0;
    let mut last_valid: Option<f64> = None;
    for s in samples.iter_mut() {
        if is_valid(s.value) {
            last_valid = s.value;
        } else if let Some(v) = last_valid {
            s.value = Some(v);
            filled += 1;
        }
    }

    // Leading gaps precede every valid value, so the forward pass left them
    // alone; give them the first valid value and stop there.
    let mut backfilled = 0;
    let first_valid = samples.iter().position(|s| is_valid(s.value));
    if let Some(idx) = first_valid {
        let v = samples[idx].value;
        for s in samples[..idx].iter_mut() {
            s.value = v;
            backfilled += 1;
        }
    }

    RepairedSeries {
        entity_id,
        samples,
        filled,
        backfilled,
        plottable: first_valid.is_some(),
    }
}

/// Split a mixed sample list by entity and repair each independently.
///
/// Output is ordered by entity id.
pub fn repair_by_entity(samples: Vec<Sample>) -> Vec<RepairedSeries> {
    let mut by_entity: BTreeMap<String, Vec<Sample>> = BTreeMap::new();
    for s in samples {
        by_entity.entry(s.entity_id.clone()).or_default().push(s);
    }
    by_entity.into_values().map(repair_series).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(entity: &str, values: &[Option<f64>]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(entity, i as i64 * 60_000, *v))
            .collect()
    }

    fn values(r: &RepairedSeries) -> Vec<Option<f64>> {
        r.samples.iter().map(|s| s.value).collect()
    }

    #[test]
    fn fully_valid_series_is_unchanged() {
        let input = series("a", &[Some(1.0), Some(2.0), Some(3.0)]);
        let out = repair_series(input.clone());
        assert_eq!(out.samples, input);
        assert_eq!(out.filled, 0);
        assert_eq!(out.backfilled, 0);
        assert!(out.is_plottable());
    }

    #[test]
    fn leading_gap_is_backfilled_and_trailing_gap_forward_filled() {
        let out = repair_series(series("a", &[Some(0.0), None, Some(5.0), Some(0.0)]));
        assert_eq!(values(&out), vec![Some(5.0); 4]);
        assert_eq!(out.backfilled, 2);
        assert_eq!(out.filled, 1);
    }

    #[test]
    fn forward_fill_uses_most_recent_valid_value() {
        let out = repair_series(series(
            "x",
            &[Some(100.0), Some(0.0), Some(0.0), Some(130.0), Some(0.0)],
        ));
        assert_eq!(
            values(&out),
            vec![Some(100.0), Some(100.0), Some(100.0), Some(130.0), Some(130.0)]
        );
        assert_eq!(out.filled, 3);
    }

    #[test]
    fn never_valid_series_stays_invalid() {
        let out = repair_series(series("a", &[Some(0.0), None, Some(f64::NAN)]));
        assert!(!out.is_plottable());
        assert_eq!(out.samples.len(), 3);
        assert!(out.samples.iter().all(|s| !s.is_valid()));
    }

    #[test]
    fn empty_series_repairs_to_empty() {
        let out = repair_series(Vec::new());
        assert!(out.samples.is_empty());
        assert!(!out.is_plottable());
    }

    #[test]
    fn unsorted_input_is_sorted_stably_before_filling() {
        let input = vec![
            Sample::new("a", 3_000, Some(0.0)),
            Sample::new("a", 1_000, Some(10.0)),
            Sample::new("a", 2_000, Some(20.0)),
            Sample::new("a", 2_000, Some(0.0)),
        ];
        let out = repair_series(input);
        let ts: Vec<_> = out.samples.iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(ts, vec![1_000, 2_000, 2_000, 3_000]);
        assert_eq!(
            values(&out),
            vec![Some(10.0), Some(20.0), Some(20.0), Some(20.0)]
        );
    }

    #[test]
    fn entities_do_not_leak_into_each_other() {
        let mut mixed = Vec::new();
        for (i, (a, b)) in [(10.0, 0.0), (0.0, 0.0), (0.0, 20.0)].iter().enumerate() {
            let ts = i as i64 * 60_000;
            mixed.push(Sample::new("a", ts, Some(*a)));
            mixed.push(Sample::new("b", ts, Some(*b)));
        }
        let out = repair_by_entity(mixed);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].entity_id, "a");
        assert_eq!(values(&out[0]), vec![Some(10.0); 3]);
        assert_eq!(out[1].entity_id, "b");
        assert_eq!(values(&out[1]), vec![Some(20.0); 3]);
    }

    #[test]
    fn injected_predicate_can_accept_zero() {
        let out = repair_series_with(series("a", &[Some(0.0), None]), |v| {
            v.is_some_and(f64::is_finite)
        });
        assert_eq!(values(&out), vec![Some(0.0), Some(0.0)]);
        assert_eq!(out.filled, 1);
    }
}
