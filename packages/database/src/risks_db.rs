//! Hourly risk scores stored in `DuckDB`.
//!
//! Timestamps are the forecast's local `YYYY-MM-DDTHH:MM` tokens, stored
//! as TEXT so they compare lexicographically in time order.
//!
//! A full refresh writes into `risks_staging` and swaps it into `risks`
//! in one transaction, so readers never see a partially collected map.

use std::path::Path;
use std::time::{Duration, SystemTime};

use duckdb::Connection;
use wearisk_risk_models::{HourlyRisk, RiskRecord};

use crate::DbError;

/// Opens (or creates) the risks `DuckDB` and ensures the schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        crate::paths::ensure_dir(parent)?;
    }

    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Opens an in-memory risks DB.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

const RISKS: &str = "risks";
const STAGING: &str = "risks_staging";

fn table_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            department_code TEXT NOT NULL,
            department_name TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            electrical_risk DOUBLE,
            flood_risk DOUBLE,
            heat_risk DOUBLE,
            wind_risk DOUBLE,
            overall_risk DOUBLE,
            created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
        );"
    )
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(&format!(
        "{}
        CREATE INDEX IF NOT EXISTS idx_risks_timestamp ON {RISKS} (timestamp);",
        table_ddl(RISKS)
    ))?;
    Ok(())
}

/// Inserts rows in a single transaction.
///
/// # Errors
///
/// Returns [`DbError`] if any insert fails; nothing is committed then.
pub fn insert_risks(conn: &mut Connection, rows: &[HourlyRisk]) -> Result<usize, DbError> {
    insert_into(conn, RISKS, rows)
}

fn insert_into(conn: &mut Connection, table: &str, rows: &[HourlyRisk]) -> Result<usize, DbError> {
    if rows.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {table} (department_code, department_name, timestamp,
                electrical_risk, flood_risk, heat_risk, wind_risk, overall_risk)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        ))?;

        for row in rows {
            stmt.execute(duckdb::params![
                row.department_code,
                row.department_name,
                row.timestamp,
                row.electrical,
                row.flood,
                row.heat,
                row.wind,
                row.overall,
            ])?;
        }
    }
    tx.commit()?;

    log::debug!("Inserted {} rows into {table}", rows.len());
    Ok(rows.len())
}

/// Creates an empty staging table, dropping any left over from an
/// interrupted refresh.
///
/// # Errors
///
/// Returns [`DbError`] if the table cannot be recreated.
pub fn begin_staging(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {STAGING};\n{}", table_ddl(STAGING)))?;
    Ok(())
}

/// Inserts rows into the staging table in a single transaction.
///
/// # Errors
///
/// Returns [`DbError`] if staging was not begun or an insert fails.
pub fn insert_staged(conn: &mut Connection, rows: &[HourlyRisk]) -> Result<usize, DbError> {
    insert_into(conn, STAGING, rows)
}

/// Replaces every stored row with the staged rows and drops the staging
/// table, atomically. Returns the number of rows now stored.
///
/// # Errors
///
/// Returns [`DbError`] if staging was not begun or the swap fails; the
/// stored rows are unchanged then.
pub fn promote_staging(conn: &mut Connection) -> Result<usize, DbError> {
    let tx = conn.transaction()?;
    let replaced = tx.execute(&format!("DELETE FROM {RISKS}"), [])?;
    let promoted = tx.execute(&format!("INSERT INTO {RISKS} SELECT * FROM {STAGING}"), [])?;
    tx.execute_batch(&format!("DROP TABLE {STAGING};"))?;
    tx.commit()?;

    log::info!("Replaced {replaced} stored risk rows with {promoted} new rows");
    Ok(promoted)
}

/// Drops the staging table without touching stored rows.
///
/// # Errors
///
/// Returns [`DbError`] if the drop fails.
pub fn discard_staging(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {STAGING};"))?;
    Ok(())
}

/// Distinct stored timestamps, ascending.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn list_timestamps(conn: &Connection) -> Result<Vec<String>, DbError> {
    let mut stmt = conn.prepare("SELECT DISTINCT timestamp FROM risks ORDER BY timestamp")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut timestamps = Vec::new();
    for ts in rows {
        timestamps.push(ts?);
    }
    Ok(timestamps)
}

/// One record per department at `timestamp`, ordered by department code.
///
/// If a department was stored more than once for the same hour, the most
/// recently inserted row wins.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn records_at(conn: &Connection, timestamp: &str) -> Result<Vec<RiskRecord>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT department_code, electrical_risk, flood_risk, heat_risk, wind_risk, overall_risk
         FROM risks
         WHERE timestamp = ?
         QUALIFY row_number() OVER (PARTITION BY department_code ORDER BY created_at DESC) = 1
         ORDER BY department_code",
    )?;

    let rows = stmt.query_map([timestamp], |row| {
        Ok(RiskRecord {
            department_code: row.get(0)?,
            electrical_risk: row.get(1)?,
            flood_risk: row.get(2)?,
            heat_risk: row.get(3)?,
            wind_risk: row.get(4)?,
            overall_risk: row.get(5)?,
        })
    })?;

    let mut records = Vec::new();
    for record in rows {
        records.push(record?);
    }
    Ok(records)
}

/// Flushes the write-ahead log into the database file.
///
/// # Errors
///
/// Returns [`DbError`] if the checkpoint fails.
pub fn checkpoint(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch("CHECKPOINT;")?;
    Ok(())
}

/// Whether the database at `path` is missing or older than `max_age`.
///
/// An unreadable modification time counts as stale.
#[must_use]
pub fn needs_refresh(path: &Path, max_age: Duration) -> bool {
    let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(e) => {
            log::debug!("Risk database {} unavailable ({e}), refresh needed", path.display());
            return true;
        }
    };

    SystemTime::now()
        .duration_since(modified)
        .is_ok_and(|age| age > max_age)
}

/// Deletes the database file and its write-ahead log, if present.
///
/// # Errors
///
/// Returns [`DbError::Io`] if an existing file cannot be removed.
pub fn remove(path: &Path) -> Result<(), DbError> {
    let mut wal = path.as_os_str().to_owned();
    wal.push(".wal");

    for file in [path.to_path_buf(), wal.into()] {
        match std::fs::remove_file(&file) {
            Ok(()) => log::debug!("Removed {}", file.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, timestamp: &str, overall: f64) -> HourlyRisk {
        HourlyRisk {
            department_code: code.to_string(),
            department_name: format!("Département {code}"),
            timestamp: timestamp.to_string(),
            electrical: 1.0,
            flood: 2.0,
            heat: 3.0,
            wind: 4.0,
            overall,
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("wearisk_{name}_{}.duckdb", std::process::id()))
    }

    #[test]
    fn lists_distinct_timestamps_ascending() {
        let mut conn = open_in_memory().unwrap();
        insert_risks(
            &mut conn,
            &[
                row("01", "2025-06-01T02:00", 5.0),
                row("01", "2025-06-01T00:00", 5.0),
                row("02", "2025-06-01T00:00", 5.0),
                row("01", "2025-06-01T01:00", 5.0),
            ],
        )
        .unwrap();

        assert_eq!(
            list_timestamps(&conn).unwrap(),
            vec!["2025-06-01T00:00", "2025-06-01T01:00", "2025-06-01T02:00"]
        );
    }

    #[test]
    fn records_at_returns_one_row_per_department() {
        let mut conn = open_in_memory().unwrap();
        insert_risks(
            &mut conn,
            &[
                row("02", "2025-06-01T00:00", 20.0),
                row("01", "2025-06-01T00:00", 10.0),
                row("01", "2025-06-01T01:00", 99.0),
            ],
        )
        .unwrap();

        let records = records_at(&conn, "2025-06-01T00:00").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].department_code, "01");
        assert_eq!(records[0].overall_risk, Some(10.0));
        assert_eq!(records[0].heat_risk, Some(3.0));
        assert_eq!(records[1].department_code, "02");

        assert!(records_at(&conn, "1999-01-01T00:00").unwrap().is_empty());
    }

    #[test]
    fn staged_rows_replace_stored_rows_on_promote() {
        let mut conn = open_in_memory().unwrap();
        insert_risks(&mut conn, &[row("01", "2025-06-01T00:00", 1.0), row("02", "2025-06-01T00:00", 2.0)])
            .unwrap();

        begin_staging(&conn).unwrap();
        insert_staged(&mut conn, &[row("01", "2025-06-02T00:00", 50.0)]).unwrap();
        assert_eq!(list_timestamps(&conn).unwrap(), vec!["2025-06-01T00:00"]);

        assert_eq!(promote_staging(&mut conn).unwrap(), 1);
        assert_eq!(list_timestamps(&conn).unwrap(), vec!["2025-06-02T00:00"]);
        let records = records_at(&conn, "2025-06-02T00:00").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].overall_risk, Some(50.0));

        assert!(promote_staging(&mut conn).is_err());
        assert_eq!(list_timestamps(&conn).unwrap(), vec!["2025-06-02T00:00"]);
    }

    #[test]
    fn begin_staging_drops_leftover_rows() {
        let mut conn = open_in_memory().unwrap();
        begin_staging(&conn).unwrap();
        insert_staged(&mut conn, &[row("01", "2025-06-01T00:00", 1.0)]).unwrap();

        begin_staging(&conn).unwrap();
        assert_eq!(promote_staging(&mut conn).unwrap(), 0);
        assert!(list_timestamps(&conn).unwrap().is_empty());
    }

    #[test]
    fn discarded_staging_keeps_stored_rows() {
        let mut conn = open_in_memory().unwrap();
        insert_risks(&mut conn, &[row("01", "2025-06-01T00:00", 1.0)]).unwrap();
        begin_staging(&conn).unwrap();
        insert_staged(&mut conn, &[row("02", "2025-06-02T00:00", 2.0)]).unwrap();

        discard_staging(&conn).unwrap();
        assert_eq!(list_timestamps(&conn).unwrap(), vec!["2025-06-01T00:00"]);
        assert!(insert_staged(&mut conn, &[row("03", "2025-06-02T00:00", 3.0)]).is_err());
    }

    #[test]
    fn empty_insert_is_a_no_op() {
        let mut conn = open_in_memory().unwrap();
        assert_eq!(insert_risks(&mut conn, &[]).unwrap(), 0);
        assert!(list_timestamps(&conn).unwrap().is_empty());
    }

    #[test]
    fn file_database_round_trips_and_is_removed() {
        let path = temp_path("roundtrip");
        remove(&path).unwrap();

        {
            let mut conn = open(&path).unwrap();
            insert_risks(&mut conn, &[row("75", "2025-06-01T12:00", 42.0)]).unwrap();
        }
        {
            let conn = open(&path).unwrap();
            assert_eq!(list_timestamps(&conn).unwrap(), vec!["2025-06-01T12:00"]);
        }

        assert!(!needs_refresh(&path, Duration::from_secs(12 * 3600)));
        remove(&path).unwrap();
        assert!(!path.exists());
        assert!(needs_refresh(&path, Duration::from_secs(12 * 3600)));
    }

    #[test]
    fn missing_or_old_file_needs_refresh() {
        let path = temp_path("stale");
        std::fs::write(&path, b"").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(needs_refresh(&path, Duration::from_millis(1)));
        std::fs::remove_file(&path).unwrap();

        assert!(needs_refresh(&temp_path("never_created"), Duration::from_secs(60)));
    }
}
