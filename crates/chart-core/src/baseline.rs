use crate::repair::repair_series;
use crate::sample::{Sample, BASELINE_KEY};

/// How the reference holding is sized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BaselineSpec {
    /// Hold exactly this many units of the reference asset.
    FixedQuantity(f64),
    /// Spend this much at the window's first valid price and hold.
    StartingCapital(f64),
}

/// Turn a reference price series into the value of a buy-and-hold position.
///
/// Prices get the same forward/back-fill as agent valuations. Returns an
/// empty vec when no usable price exists in the window, which callers treat
/// as "no baseline" rather than an error.
pub fn build_baseline(prices: Vec<Sample>, spec: BaselineSpec) -> Vec<Sample> {
    let repaired = repair_series(prices);
    if !repaired.is_plottable() {
        return Vec::new();
    }

    let quantity = match spec {
        BaselineSpec::FixedQuantity(q) => q,
        BaselineSpec::StartingCapital(capital) => {
            // Plottable series always start with a valid price after back-fill.
            match repaired.samples.first().and_then(|s| s.value) {
                Some(first) => capital / first,
                None => return Vec::new(),
            }
        }
    };
    if !quantity.is_finite() || quantity <= 0.0 {
        return Vec::new();
    }

    repaired
        .samples
        .into_iter()
        .map(|s| Sample {
            entity_id: BASELINE_KEY.to_string(),
            timestamp_ms: s.timestamp_ms,
            value: s.value.map(|p| p * quantity),
        })
        .collect()
}
