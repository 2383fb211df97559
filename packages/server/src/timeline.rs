//! Builds `/api/map-data` responses from the risk database.
//!
//! "Latest" means the most recent stored hour that is not in the future:
//! the greatest timestamp not after the current local hour, or the
//! earliest stored one if every timestamp is still ahead.

use chrono::NaiveDateTime;
use duckdb::Connection;
use wearisk_database::DbError;
use wearisk_database::risks_db;
use wearisk_risk_models::{RiskType, TimestampSelection};
use wearisk_server_models::ApiMapData;

/// Why a map-data response could not be built.
#[derive(Debug, thiserror::Error)]
pub enum MapDataError {
    /// Nothing has been collected yet.
    #[error("No risk data available")]
    NoData,

    /// The requested timestamp is not stored.
    #[error("Unknown timestamp: {0}")]
    UnknownTimestamp(String),

    /// Database query failed.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// The current local hour as a stored timestamp token.
#[must_use]
pub fn hour_token(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%dT%H:00").to_string()
}

/// Resolves `requested` against the ascending `timestamps`.
///
/// # Errors
///
/// Returns [`MapDataError::NoData`] if `timestamps` is empty, or
/// [`MapDataError::UnknownTimestamp`] if an explicit token is not in it.
pub fn resolve_timestamp<'a>(
    timestamps: &'a [String],
    requested: &TimestampSelection,
    now_token: &str,
) -> Result<&'a str, MapDataError> {
    let first = timestamps.first().ok_or(MapDataError::NoData)?;

    match requested {
        TimestampSelection::Latest => Ok(timestamps
            .iter()
            .rev()
            .find(|ts| ts.as_str() <= now_token)
            .unwrap_or(first)
            .as_str()),
        TimestampSelection::At(token) => timestamps
            .iter()
            .find(|ts| *ts == token)
            .map(String::as_str)
            .ok_or_else(|| MapDataError::UnknownTimestamp(token.clone())),
    }
}

/// Builds the response for one risk type and time slice. Records are
/// sorted by the selected risk type, highest first.
///
/// # Errors
///
/// Returns [`MapDataError`] if there is no data, the timestamp is
/// unknown, or a query fails.
pub fn build_map_data(
    conn: &Connection,
    risk_type: RiskType,
    requested: &TimestampSelection,
    now_token: &str,
) -> Result<ApiMapData, MapDataError> {
    let timestamps = risks_db::list_timestamps(conn)?;
    let current = resolve_timestamp(&timestamps, requested, now_token)?.to_string();

    let mut data = risks_db::records_at(conn, &current)?;
    data.sort_by(|a, b| {
        let a = a.value(risk_type).unwrap_or(0.0);
        let b = b.value(risk_type).unwrap_or(0.0);
        b.total_cmp(&a)
    });

    log::debug!(
        "Serving {} records for {risk_type} at {current} ({} timestamps stored)",
        data.len(),
        timestamps.len()
    );

    Ok(ApiMapData {
        data: Some(data),
        timestamps: Some(timestamps),
        current_timestamp: Some(current),
        risk_type: Some(risk_type),
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wearisk_risk_models::HourlyRisk;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn row(code: &str, timestamp: &str, overall: f64, flood: f64) -> HourlyRisk {
        HourlyRisk {
            department_code: code.to_string(),
            department_name: code.to_string(),
            timestamp: timestamp.to_string(),
            electrical: 0.0,
            flood,
            heat: 0.0,
            wind: 0.0,
            overall,
        }
    }

    #[test]
    fn hour_token_truncates_minutes() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(14, 37, 12)
            .unwrap();
        assert_eq!(hour_token(now), "2025-06-01T14:00");
    }

    #[test]
    fn latest_is_greatest_not_after_now() {
        let ts = tokens(&["2025-06-01T12:00", "2025-06-01T13:00", "2025-06-01T15:00"]);
        let latest = resolve_timestamp(&ts, &TimestampSelection::Latest, "2025-06-01T14:00");
        assert_eq!(latest.unwrap(), "2025-06-01T13:00");

        let exact = resolve_timestamp(&ts, &TimestampSelection::Latest, "2025-06-01T15:00");
        assert_eq!(exact.unwrap(), "2025-06-01T15:00");
    }

    #[test]
    fn latest_falls_back_to_earliest_when_all_in_future() {
        let ts = tokens(&["2025-06-02T00:00", "2025-06-02T01:00"]);
        let latest = resolve_timestamp(&ts, &TimestampSelection::Latest, "2025-06-01T23:00");
        assert_eq!(latest.unwrap(), "2025-06-02T00:00");
    }

    #[test]
    fn explicit_timestamp_must_exist() {
        let ts = tokens(&["2025-06-01T12:00"]);
        let at = TimestampSelection::At("2025-06-01T12:00".to_string());
        assert_eq!(resolve_timestamp(&ts, &at, "x").unwrap(), "2025-06-01T12:00");

        let missing = TimestampSelection::At("2025-06-01T13:00".to_string());
        assert!(matches!(
            resolve_timestamp(&ts, &missing, "x"),
            Err(MapDataError::UnknownTimestamp(t)) if t == "2025-06-01T13:00"
        ));
    }

    #[test]
    fn empty_store_has_no_data() {
        assert!(matches!(
            resolve_timestamp(&[], &TimestampSelection::Latest, "2025-06-01T14:00"),
            Err(MapDataError::NoData)
        ));
    }

    #[test]
    fn builds_sorted_response() {
        let mut conn = risks_db::open_in_memory().unwrap();
        risks_db::insert_risks(
            &mut conn,
            &[
                row("01", "2025-06-01T10:00", 20.0, 90.0),
                row("02", "2025-06-01T10:00", 60.0, 10.0),
                row("03", "2025-06-01T10:00", 40.0, 50.0),
                row("01", "2025-06-01T11:00", 99.0, 99.0),
            ],
        )
        .unwrap();

        let overall = build_map_data(
            &conn,
            RiskType::Overall,
            &TimestampSelection::Latest,
            "2025-06-01T10:30",
        )
        .unwrap();
        assert_eq!(overall.current_timestamp.as_deref(), Some("2025-06-01T10:00"));
        assert_eq!(overall.timestamps.as_ref().unwrap().len(), 2);
        assert_eq!(overall.risk_type, Some(RiskType::Overall));
        let codes: Vec<_> = overall
            .data
            .as_ref()
            .unwrap()
            .iter()
            .map(|r| r.department_code.as_str())
            .collect();
        assert_eq!(codes, vec!["02", "03", "01"]);

        let flood = build_map_data(
            &conn,
            RiskType::Flood,
            &TimestampSelection::At("2025-06-01T10:00".to_string()),
            "2025-06-01T23:00",
        )
        .unwrap();
        let codes: Vec<_> = flood
            .data
            .unwrap()
            .into_iter()
            .map(|r| r.department_code)
            .collect();
        assert_eq!(codes, vec!["01", "03", "02"]);
    }
}
