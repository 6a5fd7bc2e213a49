use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use std::path::Path;

use crate::error::HubError;

pub type DbPool = Pool<SqliteConnectionManager>;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS portfolio_snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_id TEXT NOT NULL,
    ts_ms INTEGER NOT NULL,
    total_value REAL
);
CREATE INDEX IF NOT EXISTS idx_portfolio_snapshots_ts
ON portfolio_snapshots(ts_ms);

CREATE TABLE IF NOT EXISTS reference_prices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL,
    ts_ms INTEGER NOT NULL,
    price REAL
);
CREATE INDEX IF NOT EXISTS idx_reference_prices_symbol_ts
ON reference_prices(symbol, ts_ms);
"#;

/// Open a read-write SQLite pool for the given database file, creating the
/// file and schema when missing.
pub fn open_pool(path: &Path, max_size: u32) -> Result<DbPool, HubError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX
        | OpenFlags::SQLITE_OPEN_URI;
    let manager = SqliteConnectionManager::file(path)
        .with_flags(flags)
        .with_init(|c| c.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;"));
    let pool = Pool::builder().max_size(max_size).build(manager)?;

    pool.get()?.execute_batch(SCHEMA)?;
    tracing::info!("store ready: {}", path.display());
    Ok(pool)
}
