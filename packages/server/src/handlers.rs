//! HTTP handler functions for the metrics API.

use actix_web::{HttpResponse, web};
use wearisk_database::risks_db;
use wearisk_risk_models::{RiskType, TimestampSelection};
use wearisk_server_models::{ApiError, ApiHealth, MapDataParams};

use crate::timeline::{MapDataError, build_map_data, hour_token};
use crate::{AppState, lock_db};

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let timestamps = lock_db(&state.db)
        .ok()
        .and_then(|conn| risks_db::list_timestamps(&conn).ok());

    HttpResponse::Ok().json(ApiHealth {
        healthy: timestamps.is_some(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp_count: timestamps.map_or(0, |t| t.len()),
    })
}

/// `GET /api/map-data`
///
/// Returns one record per department for the requested risk type and
/// forecast hour (latest by default), plus every stored timestamp.
pub async fn map_data(
    state: web::Data<AppState>,
    params: web::Query<MapDataParams>,
) -> HttpResponse {
    let risk_type = match parse_risk_type(params.risk_type.as_deref()) {
        Ok(risk_type) => risk_type,
        Err(message) => return HttpResponse::BadRequest().json(ApiError::new(message)),
    };

    let requested: TimestampSelection = params
        .timestamp
        .as_deref()
        .map(|s| s.parse().unwrap_or_default())
        .unwrap_or_default();

    let now = hour_token(chrono::Local::now().naive_local());

    let conn = match lock_db(&state.db) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Map data request failed: {e}");
            return HttpResponse::InternalServerError().json(ApiError::new("Database unavailable"));
        }
    };

    match build_map_data(&conn, risk_type, &requested, &now) {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e @ (MapDataError::NoData | MapDataError::UnknownTimestamp(_))) => {
            log::debug!("Map data not found: {e}");
            HttpResponse::NotFound().json(ApiError::new(e.to_string()))
        }
        Err(e) => {
            log::error!("Map data query failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Database error"))
        }
    }
}

fn parse_risk_type(raw: Option<&str>) -> Result<RiskType, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(RiskType::default()),
        Some(s) => s.parse().map_err(|_| format!("Unknown risk type: {s}")),
    }
}
