//! Open-Meteo forecast client.
//!
//! One request per department: a one-day hourly forecast in local French
//! time. Requests go through a shared [`RateLimiter`].

use std::time::Duration;

use serde::Deserialize;
use wearisk_config::WeatherConfig;

use crate::WeatherError;
use crate::collector::ForecastSource;
use crate::departments::Department;
use crate::rate_limit::RateLimiter;

const HOURLY_VARIABLES: &str = "temperature_2m,precipitation,wind_gusts_10m,relative_humidity_2m";
const DAILY_VARIABLES: &str = "temperature_2m_max,precipitation_sum";
const TIMEZONE: &str = "Europe/Paris";
const FORECAST_DAYS: &str = "1";

/// Hourly series of a forecast. Values may be `null` in the response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HourlySeries {
    /// Local timestamps, `YYYY-MM-DDTHH:MM`.
    pub time: Vec<String>,
    /// Air temperature at 2 m (°C).
    pub temperature_2m: Vec<Option<f64>>,
    /// Precipitation (mm).
    pub precipitation: Vec<Option<f64>>,
    /// Wind gusts at 10 m (km/h).
    pub wind_gusts_10m: Vec<Option<f64>>,
    /// Relative humidity at 2 m (%).
    pub relative_humidity_2m: Vec<Option<f64>>,
}

/// Daily aggregates of a forecast.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DailySeries {
    /// Local dates.
    pub time: Vec<String>,
    /// Maximum air temperature (°C).
    pub temperature_2m_max: Vec<Option<f64>>,
    /// Precipitation total (mm).
    pub precipitation_sum: Vec<Option<f64>>,
}

/// The parts of an Open-Meteo forecast response we use.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForecastResponse {
    /// Hourly series.
    pub hourly: HourlySeries,
    /// Daily aggregates.
    pub daily: DailySeries,
}

/// Rate-limited Open-Meteo client.
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
}

impl OpenMeteoClient {
    /// Creates a client.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, limiter: RateLimiter) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            limiter,
        }
    }

    /// Creates a client from the `[weather]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let limiter =
            RateLimiter::per_minute_and_hour(config.max_calls_per_minute, config.max_calls_per_hour);
        Ok(Self::new(client, &config.base_url, limiter))
    }

    /// Query parameters for one department.
    fn query(department: &Department) -> [(&'static str, String); 6] {
        [
            ("latitude", department.latitude.to_string()),
            ("longitude", department.longitude.to_string()),
            ("hourly", HOURLY_VARIABLES.to_string()),
            ("daily", DAILY_VARIABLES.to_string()),
            ("timezone", TIMEZONE.to_string()),
            ("forecast_days", FORECAST_DAYS.to_string()),
        ]
    }
}

#[async_trait::async_trait]
impl ForecastSource for OpenMeteoClient {
    async fn fetch_forecast(&self, department: &Department) -> Result<ForecastResponse, WeatherError> {
        self.limiter.acquire().await;

        log::debug!("Fetching forecast for {} ({})", department.name, department.code);
        let resp = self
            .client
            .get(&self.base_url)
            .query(&Self::query(department))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(WeatherError::Status {
                url: resp.url().to_string(),
                status: resp.status().as_u16(),
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
