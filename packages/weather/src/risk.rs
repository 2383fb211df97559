//! Risk scores derived from hourly forecast variables.
//!
//! Every score is clamped to at most 100. Missing inputs count as 0.

use wearisk_risk_models::HourlyRisk;

use crate::departments::Department;
use crate::open_meteo::ForecastResponse;

/// Power-line risk from gusts (km/h) and relative humidity (%).
#[must_use]
pub fn electrical_risk(wind_gusts: f64, humidity: f64) -> f64 {
    wind_gusts
        .mul_add(0.2, (humidity - 80.0).max(0.0) * 0.1)
        .min(100.0)
}

/// Flood risk from hourly precipitation (mm).
#[must_use]
pub fn flood_risk(precipitation: f64) -> f64 {
    (precipitation * 2.0).min(100.0)
}

/// Heat risk from air temperature (°C).
#[must_use]
pub fn heat_risk(temperature: f64) -> f64 {
    ((temperature - 30.0).max(0.0) * 2.0).min(100.0)
}

/// Wind risk from gusts (km/h).
#[must_use]
pub fn wind_risk(wind_gusts: f64) -> f64 {
    (wind_gusts * 0.3).min(100.0)
}

/// Weighted combination of the four scores, rounded to two decimals.
#[must_use]
pub fn overall_risk(electrical: f64, flood: f64, heat: f64, wind: f64) -> f64 {
    let weighted = electrical * 0.2 + flood * 0.3 + heat * 0.2 + wind * 0.3;
    (weighted * 100.0).round() / 100.0
}

fn at(series: &[Option<f64>], i: usize) -> f64 {
    series.get(i).copied().flatten().unwrap_or(0.0)
}

/// One [`HourlyRisk`] row per forecast step.
#[must_use]
pub fn compute_hourly_risks(forecast: &ForecastResponse, department: &Department) -> Vec<HourlyRisk> {
    let hourly = &forecast.hourly;

    hourly
        .time
        .iter()
        .enumerate()
        .map(|(i, timestamp)| {
            let temperature = at(&hourly.temperature_2m, i);
            let precipitation = at(&hourly.precipitation, i);
            let gusts = at(&hourly.wind_gusts_10m, i);
            let humidity = at(&hourly.relative_humidity_2m, i);

            let electrical = electrical_risk(gusts, humidity);
            let flood = flood_risk(precipitation);
            let heat = heat_risk(temperature);
            let wind = wind_risk(gusts);

            HourlyRisk {
                department_code: department.code.clone(),
                department_name: department.name.clone(),
                timestamp: timestamp.clone(),
                electrical,
                flood,
                heat,
                wind,
                overall: overall_risk(electrical, flood, heat, wind),
            }
        })
        .collect()
}
