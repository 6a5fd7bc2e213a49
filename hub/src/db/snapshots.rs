use chart_core::Sample;
use rusqlite::{params, Connection};

use crate::error::HubError;

/// Portfolio valuations for every agent, oldest first.
///
/// `since_ms = None` returns the full history.
pub fn fetch_portfolio_samples(
    conn: &Connection,
    since_ms: Option<i64>,
) -> Result<Vec<Sample>, HubError> {
    let mut stmt = conn.prepare(
        "SELECT agent_id, ts_ms, total_value
         FROM portfolio_snapshots
         WHERE ?1 IS NULL OR ts_ms >= ?1
         ORDER BY ts_ms ASC, id ASC",
    )?;

    let rows = stmt
        .query_map(params![since_ms], |row| {
            Ok(Sample {
                entity_id: row.get(0)?,
                timestamp_ms: row.get(1)?,
                value: row.get::<_, Option<f64>>(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Append validated snapshots in one transaction. Returns the row count.
pub fn insert_portfolio_samples(
    conn: &mut Connection,
    samples: &[Sample],
) -> Result<usize, HubError> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO portfolio_snapshots (agent_id, ts_ms, total_value) VALUES (?1, ?2, ?3)",
        )?;
        for s in samples {
            stmt.execute(params![s.entity_id, s.timestamp_ms, s.value])?;
        }
    }
    tx.commit()?;
    Ok(samples.len())
}
