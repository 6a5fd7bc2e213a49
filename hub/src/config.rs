use std::env;
use std::path::PathBuf;

use chart_core::{BaselineSpec, LabelFormat, RangeTable, RangeTier};

/// Hub configuration derived from environment variables.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub bind: String,
    pub port: u16,

    // ── Store ──────────────────────────────────────────────────────
    pub db_path: PathBuf,
    pub db_pool_size: u32,

    /// Shared secret for webhook routes.  Empty ⇒ webhooks disabled.
    pub webhook_secret: String,

    // ── Charts ─────────────────────────────────────────────────────
    pub chart_cache_ttl_s: u64,
    pub default_range: RangeTier,
    pub baseline_symbol: String,
    pub baseline_capital: f64,
    pub label_utc_offset_min: i32,
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_i32(name: &str, default: i32) -> i32 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl HubConfig {
    pub fn from_env() -> Self {
        let ranges = RangeTable::default();
        let default_range = ranges
            .parse_tier(&env_str("ARENA_DEFAULT_RANGE", "24h"))
            .unwrap_or(RangeTier::Day);

        Self {
            bind: env_str("ARENA_BIND", "127.0.0.1"),
            port: env_u16("ARENA_PORT", 61020),
            db_path: PathBuf::from(env_str("ARENA_DB", "arena.db")),
            db_pool_size: env_u32("ARENA_DB_POOL_SIZE", 4).max(1),
            webhook_secret: env_str("ARENA_WEBHOOK_SECRET", ""),
            chart_cache_ttl_s: env_u64("ARENA_CHART_CACHE_TTL_S", 60),
            default_range,
            baseline_symbol: env_str("ARENA_BASELINE_SYMBOL", "BTC").to_uppercase(),
            baseline_capital: env_f64("ARENA_BASELINE_CAPITAL", 10_000.0),
            label_utc_offset_min: env_i32("ARENA_LABEL_UTC_OFFSET_MIN", 0),
        }
    }

    /// Range table with the configured fallback tier.
    pub fn range_table(&self) -> RangeTable {
        RangeTable::with_default_tier(self.default_range)
    }

    pub fn baseline_spec(&self) -> BaselineSpec {
        BaselineSpec::StartingCapital(self.baseline_capital)
    }

    pub fn label_format(&self) -> LabelFormat {
        LabelFormat::with_offset_minutes(self.label_utc_offset_min)
    }
}

#[cfg(test)]
impl HubConfig {
    /// Config pointing at a throwaway database, for handler tests.
    pub fn for_tests(db_path: PathBuf) -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 0,
            db_path,
            db_pool_size: 2,
            webhook_secret: "s3cret".to_string(),
            chart_cache_ttl_s: 60,
            default_range: RangeTier::Day,
            baseline_symbol: "BTC".to_string(),
            baseline_capital: 10_000.0,
            label_utc_offset_min: 0,
        }
    }
}
