use chart_core::Sample;
use rusqlite::{params, Connection};

use crate::error::HubError;

/// Reference prices for one symbol, oldest first. Samples carry the symbol
/// as their entity id.
pub fn fetch_reference_prices(
    conn: &Connection,
    symbol: &str,
    since_ms: Option<i64>,
) -> Result<Vec<Sample>, HubError> {
    let mut stmt = conn.prepare(
        "SELECT ts_ms, price
         FROM reference_prices
         WHERE symbol = ?1 AND (?2 IS NULL OR ts_ms >= ?2)
         ORDER BY ts_ms ASC, id ASC",
    )?;

    let rows = stmt
        .query_map(params![symbol, since_ms], |row| {
            Ok(Sample {
                entity_id: symbol.to_string(),
                timestamp_ms: row.get(0)?,
                value: row.get::<_, Option<f64>>(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Append `(ts_ms, price)` points for a symbol in one transaction.
pub fn insert_reference_prices(
    conn: &mut Connection,
    symbol: &str,
    points: &[(i64, Option<f64>)],
) -> Result<usize, HubError> {
    let tx = conn.transaction()?;
    {
        let mut stmt =
            tx.prepare("INSERT INTO reference_prices (symbol, ts_ms, price) VALUES (?1, ?2, ?3)")?;
        for (ts_ms, price) in points {
            stmt.execute(params![symbol, ts_ms, price])?;
        }
    }
    tx.commit()?;
    Ok(points.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_is_scoped_to_symbol_and_window() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE reference_prices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                ts_ms INTEGER NOT NULL,
                price REAL
            );",
        )
        .unwrap();
        insert_reference_prices(&mut conn, "BTC", &[(1_000, Some(60_000.0)), (2_000, None)])
            .unwrap();
        insert_reference_prices(&mut conn, "ETH", &[(1_500, Some(3_000.0))]).unwrap();

        let btc = fetch_reference_prices(&conn, "BTC", None).unwrap();
        assert_eq!(btc.len(), 2);
        assert!(btc.iter().all(|s| s.entity_id == "BTC"));
        assert_eq!(btc[1].value, None);

        let recent = fetch_reference_prices(&conn, "BTC", Some(1_500)).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].timestamp_ms, 2_000);
    }
}
