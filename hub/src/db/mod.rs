pub mod pool;
pub mod prices;
pub mod snapshots;
