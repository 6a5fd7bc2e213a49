use chart_core::{ChartPoint, RangeTier};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct CachedChart {
    stored_at: Instant,
    rows: Arc<Vec<ChartPoint>>,
}

/// Short-lived chart responses keyed by resolved range tier.
///
/// The store is written about once a minute, so serving a chart that is up
/// to `ttl` old is fine. A zero TTL disables caching.
///
/// Every invalidation bumps a generation counter. Readers capture it with
/// [`ChartCache::generation`] before touching the store and hand it back to
/// [`ChartCache::put`], which refuses rows built before a later write.
pub struct ChartCache {
    ttl: Duration,
    generation: AtomicU64,
    entries: RwLock<HashMap<RangeTier, CachedChart>>,
}

impl ChartCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: AtomicU64::new(0),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, tier: RangeTier) -> Option<Arc<Vec<ChartPoint>>> {
        if self.ttl.is_zero() {
            return None;
        }
        let entries = self.entries.read().await;
        entries
            .get(&tier)
            .filter(|c| c.stored_at.elapsed() < self.ttl)
            .map(|c| Arc::clone(&c.rows))
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store rows built from a store read that began at `generation`.
    /// Returns false when an invalidation happened since.
    pub async fn put(
        &self,
        tier: RangeTier,
        rows: Arc<Vec<ChartPoint>>,
        generation: u64,
    ) -> bool {
        if self.ttl.is_zero() {
            return false;
        }
        let mut entries = self.entries.write().await;
        if self.generation.load(Ordering::Acquire) != generation {
            return false;
        }
        entries.insert(
            tier,
            CachedChart {
                stored_at: Instant::now(),
                rows,
            },
        );
        true
    }

    /// Drop everything; called after webhook writes.
    pub async fn invalidate(&self) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }
}
