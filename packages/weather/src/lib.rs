#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Weather forecast collection for the WeaRisk risk database.
//!
//! Fetches one-day hourly forecasts from Open-Meteo for every
//! metropolitan department, turns each forecast step into electrical,
//! flood, heat, wind, and overall risk scores, and hands the rows to a
//! caller-supplied sink batch by batch.

pub mod collector;
pub mod departments;
pub mod open_meteo;
pub mod progress;
pub mod rate_limit;
pub mod risk;

pub use collector::{CollectSummary, CollectorSettings, ForecastSource, collect};
pub use departments::{Department, all_departments};
pub use open_meteo::{ForecastResponse, OpenMeteoClient};
pub use progress::{NullProgress, ProgressCallback, null_progress};
pub use rate_limit::RateLimiter;
pub use risk::compute_hourly_risks;

use thiserror::Error;

/// Errors that can occur while fetching forecasts.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The forecast API answered with a non-success status.
    #[error("HTTP error {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
