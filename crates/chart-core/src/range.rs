use chrono::Duration;
use serde::Serialize;

const MINUTE_MS: i64 = 60_000;

/// Named lookback tiers offered to chart surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RangeTier {
    #[serde(rename = "1H")]
    OneHour,
    #[serde(rename = "24H")]
    Day,
    #[serde(rename = "7D")]
    Week,
    #[serde(rename = "30D")]
    Month,
    #[serde(rename = "ALL")]
    All,
}

impl RangeTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneHour => "1H",
            Self::Day => "24H",
            Self::Week => "7D",
            Self::Month => "30D",
            Self::All => "ALL",
        }
    }
}

/// Lookback window and bucket width for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeSpec {
    pub tier: RangeTier,
    /// `None` means unbounded ("all time").
    #[serde(serialize_with = "serialize_lookback")]
    pub lookback: Option<Duration>,
    pub bucket_minutes: u32,
}

fn serialize_lookback<S: serde::Serializer>(
    lookback: &Option<Duration>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match lookback {
        Some(d) => s.serialize_some(&d.num_milliseconds()),
        None => s.serialize_none(),
    }
}

impl RangeSpec {
    pub fn bucket_width_ms(&self) -> i64 {
        i64::from(self.bucket_minutes) * MINUTE_MS
    }

    /// Lower bound (epoch ms) for the store query, or `None` for all time.
    pub fn since_ms(&self, now_ms: i64) -> Option<i64> {
        self.lookback
            .map(|d| now_ms.saturating_sub(d.num_milliseconds()))
    }
}

struct TierEntry {
    keys: &'static [&'static str],
    spec: RangeSpec,
}

/// Immutable tier table, built once at startup and shared by reference.
pub struct RangeTable {
    entries: Vec<TierEntry>,
    default_tier: RangeTier,
}

impl Default for RangeTable {
    fn default() -> Self {
        Self::with_default_tier(RangeTier::Day)
    }
}

impl RangeTable {
    /// The standard table with a different fallback tier.
    pub fn with_default_tier(default_tier: RangeTier) -> Self {
        let entries = vec![
            TierEntry {
                keys: &["1h"],
                spec: RangeSpec {
                    tier: RangeTier::OneHour,
                    lookback: Some(Duration::hours(1)),
                    bucket_minutes: 1,
                },
            },
            TierEntry {
                keys: &["24h", "1d"],
                spec: RangeSpec {
                    tier: RangeTier::Day,
                    lookback: Some(Duration::hours(24)),
                    bucket_minutes: 1,
                },
            },
            TierEntry {
                keys: &["7d", "1w"],
                spec: RangeSpec {
                    tier: RangeTier::Week,
                    lookback: Some(Duration::days(7)),
                    bucket_minutes: 15,
                },
            },
            TierEntry {
                keys: &["30d", "1m"],
                spec: RangeSpec {
                    tier: RangeTier::Month,
                    lookback: Some(Duration::days(30)),
                    bucket_minutes: 60,
                },
            },
            TierEntry {
                keys: &["all", "max"],
                spec: RangeSpec {
                    tier: RangeTier::All,
                    lookback: None,
                    bucket_minutes: 240,
                },
            },
        ];
        Self {
            entries,
            default_tier,
        }
    }

    fn lookup(&self, key: &str) -> Option<RangeSpec> {
        let k = key.trim().to_lowercase();
        self.entries
            .iter()
            .find(|e| e.keys.contains(&k.as_str()))
            .map(|e| e.spec)
    }

    /// Spec for a tier. Every tier is present in the table.
    pub fn spec(&self, tier: RangeTier) -> RangeSpec {
        self.entries
            .iter()
            .map(|e| e.spec)
            .find(|s| s.tier == tier)
            .unwrap_or(RangeSpec {
                tier: RangeTier::Day,
                lookback: Some(Duration::hours(24)),
                bucket_minutes: 1,
            })
    }

    pub fn default_spec(&self) -> RangeSpec {
        self.spec(self.default_tier)
    }

    /// Resolve a user-supplied range key. Unknown or missing keys fall back
    /// to the default tier; this never fails.
    pub fn resolve(&self, key: Option<&str>) -> RangeSpec {
        key.and_then(|k| self.lookup(k))
            .unwrap_or_else(|| self.default_spec())
    }

    /// Parse a tier name for configuration (`ARENA_DEFAULT_RANGE`).
    pub fn parse_tier(&self, key: &str) -> Option<RangeTier> {
        self.lookup(key).map(|s| s.tier)
    }

    pub fn specs(&self) -> impl Iterator<Item = RangeSpec> + '_ {
        self.entries.iter().map(|e| e.spec)
    }
}
