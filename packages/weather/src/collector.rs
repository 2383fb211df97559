//! Batched forecast collection.
//!
//! Departments are fetched in fixed-size batches with bounded
//! concurrency inside each batch. Each batch's rows go to the sink before
//! the next batch starts, so a collection interrupted midway still leaves
//! the completed batches stored.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt as _};
use wearisk_config::WeatherConfig;
use wearisk_risk_models::HourlyRisk;

use crate::WeatherError;
use crate::departments::Department;
use crate::open_meteo::ForecastResponse;
use crate::progress::ProgressCallback;
use crate::risk::compute_hourly_risks;

/// Source of per-department forecasts.
#[async_trait::async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetches the forecast for one department.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError`] if the forecast cannot be fetched or
    /// decoded.
    async fn fetch_forecast(&self, department: &Department) -> Result<ForecastResponse, WeatherError>;
}

/// Batching parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSettings {
    /// Departments per batch.
    pub batch_size: usize,
    /// Concurrent requests within a batch.
    pub concurrency: usize,
    /// Pause between batches.
    pub batch_pause: Duration,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self::from(&WeatherConfig::default())
    }
}

impl From<&WeatherConfig> for CollectorSettings {
    fn from(config: &WeatherConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            concurrency: config.concurrency,
            batch_pause: Duration::from_secs(config.batch_pause_secs),
        }
    }
}

/// Outcome counts of a collection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectSummary {
    /// Batches processed.
    pub batches: usize,
    /// Departments that produced rows.
    pub departments_ok: usize,
    /// Departments skipped after a failure or an empty forecast.
    pub departments_failed: usize,
    /// Rows handed to the sink.
    pub rows_saved: usize,
}

/// Collects forecasts for `departments` and passes each batch's risk rows
/// to `on_batch` (batch index, rows). Failed departments are logged and
/// skipped.
///
/// # Errors
///
/// Returns the first error from `on_batch`; later batches are not
/// fetched.
#[allow(clippy::future_not_send)]
pub async fn collect<S, F, E>(
    source: &S,
    departments: &[Department],
    settings: &CollectorSettings,
    progress: &Arc<dyn ProgressCallback>,
    mut on_batch: F,
) -> Result<CollectSummary, E>
where
    S: ForecastSource + ?Sized,
    F: FnMut(usize, &[HourlyRisk]) -> Result<(), E>,
{
    let batch_size = settings.batch_size.max(1);
    let concurrency = settings.concurrency.max(1);
    let batch_count = departments.len().div_ceil(batch_size);

    log::info!(
        "Collecting forecasts for {} departments ({batch_count} batches of {batch_size}, concurrency={concurrency})",
        departments.len()
    );
    progress.set_total(departments.len() as u64);

    let mut summary = CollectSummary::default();

    for (index, batch) in departments.chunks(batch_size).enumerate() {
        progress.set_message(format!("batch {}/{batch_count}", index + 1));

        let results: Vec<_> = stream::iter(batch.iter().map(|department| async move {
            let result = source.fetch_forecast(department).await;
            (department, result)
        }))
        .buffer_unordered(concurrency)
        .collect()
        .await;

        let mut rows = Vec::new();
        for (department, result) in results {
            match result {
                Ok(forecast) => {
                    let risks = compute_hourly_risks(&forecast, department);
                    if risks.is_empty() {
                        log::warn!(
                            "Empty forecast for {} ({}), skipping",
                            department.name,
                            department.code
                        );
                        summary.departments_failed += 1;
                    } else {
                        summary.departments_ok += 1;
                        rows.extend(risks);
                    }
                }
                Err(e) => {
                    log::warn!(
                        "Forecast for {} ({}) failed: {e}",
                        department.name,
                        department.code
                    );
                    summary.departments_failed += 1;
                }
            }
            progress.inc(1);
        }

        summary.batches += 1;

        if !rows.is_empty() {
            on_batch(index, &rows)?;
            summary.rows_saved += rows.len();
            log::info!("Batch {}/{batch_count} saved: {} rows", index + 1, rows.len());
        }

        if index + 1 < batch_count && !settings.batch_pause.is_zero() {
            log::debug!("Pausing {}s before next batch", settings.batch_pause.as_secs());
            tokio::time::sleep(settings.batch_pause).await;
        }
    }

    progress.finish(format!(
        "{} departments collected, {} failed, {} rows",
        summary.departments_ok, summary.departments_failed, summary.rows_saved
    ));

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_meteo::HourlySeries;
    use crate::progress::null_progress;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    struct FakeSource {
        failing: BTreeSet<String>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(failing: &[&str]) -> Self {
            Self {
                failing: failing.iter().map(ToString::to_string).collect(),
                fetched: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ForecastSource for FakeSource {
        async fn fetch_forecast(
            &self,
            department: &Department,
        ) -> Result<ForecastResponse, WeatherError> {
            self.fetched.lock().unwrap().push(department.code.clone());
            if self.failing.contains(&department.code) {
                return Err(WeatherError::Status {
                    url: "http://test/forecast".to_string(),
                    status: 502,
                });
            }
            Ok(ForecastResponse {
                hourly: HourlySeries {
                    time: vec!["2025-06-01T00:00".to_string(), "2025-06-01T01:00".to_string()],
                    temperature_2m: vec![Some(20.0), Some(21.0)],
                    precipitation: vec![Some(0.0), Some(0.5)],
                    wind_gusts_10m: vec![Some(30.0), Some(35.0)],
                    relative_humidity_2m: vec![Some(70.0), Some(75.0)],
                },
                ..ForecastResponse::default()
            })
        }
    }

    fn departments(n: usize) -> Vec<Department> {
        (1..=n)
            .map(|i| Department {
                code: format!("{i:02}"),
                name: format!("Département {i}"),
                latitude: 46.0,
                longitude: 2.0,
            })
            .collect()
    }

    fn settings(batch_size: usize) -> CollectorSettings {
        CollectorSettings {
            batch_size,
            concurrency: 2,
            batch_pause: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn persists_each_batch_and_skips_failures() {
        let source = FakeSource::new(&["03"]);
        let mut batches: Vec<(usize, Vec<String>)> = Vec::new();

        let summary = collect(&source, &departments(5), &settings(2), &null_progress(), |i, rows| {
            batches.push((i, rows.iter().map(|r| r.department_code.clone()).collect()));
            Ok::<_, std::convert::Infallible>(())
        })
        .await
        .unwrap();

        assert_eq!(summary.batches, 3);
        assert_eq!(summary.departments_ok, 4);
        assert_eq!(summary.departments_failed, 1);
        assert_eq!(summary.rows_saved, 8);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].0, 0);
        assert_eq!(batches[1].1, vec!["04", "04"]);
        assert_eq!(batches[2].1.len(), 2);
        assert_eq!(source.fetched.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn sink_error_stops_collection() {
        let source = FakeSource::new(&[]);

        let result = collect(&source, &departments(6), &settings(2), &null_progress(), |i, _| {
            if i == 1 { Err("disk full") } else { Ok(()) }
        })
        .await;

        assert_eq!(result, Err("disk full"));
        assert_eq!(source.fetched.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn batch_without_rows_is_not_sent_to_sink() {
        let source = FakeSource::new(&["01", "02"]);
        let mut calls = 0;

        let summary = collect(&source, &departments(3), &settings(2), &null_progress(), |_, _| {
            calls += 1;
            Ok::<_, std::convert::Infallible>(())
        })
        .await
        .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(summary.departments_failed, 2);
        assert_eq!(summary.rows_saved, 2);
    }

    #[test]
    fn settings_follow_config() {
        let settings = CollectorSettings::default();
        assert_eq!(settings.batch_size, 20);
        assert_eq!(settings.concurrency, 5);
        assert_eq!(settings.batch_pause, Duration::from_secs(10));
    }
}
