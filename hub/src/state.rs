use chart_core::RangeTable;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::ChartCache;
use crate::config::HubConfig;
use crate::db::pool::{open_pool, DbPool};
use crate::error::HubError;

/// Shared application state, passed to all route handlers via `axum::extract::State`.
pub struct AppState {
    pub config: HubConfig,
    pub pool: DbPool,
    /// Built once from config; never mutated.
    pub ranges: RangeTable,
    pub chart_cache: ChartCache,
}

impl AppState {
    pub fn new(config: HubConfig) -> Result<Arc<Self>, HubError> {
        let pool = open_pool(&config.db_path, config.db_pool_size)?;
        let ranges = config.range_table();
        let chart_cache = ChartCache::new(Duration::from_secs(config.chart_cache_ttl_s));

        Ok(Arc::new(Self {
            config,
            pool,
            ranges,
            chart_cache,
        }))
    }
}
