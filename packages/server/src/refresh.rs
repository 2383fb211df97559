//! Keeps the risk database fresh.
//!
//! A refresh collects every department into a staging table and swaps it
//! in with one transaction, so `/api/map-data` keeps serving the previous
//! map until the new one is complete. A refresh that stores nothing
//! leaves the previous map in place.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use duckdb::Connection;
use wearisk_config::WeatherConfig;
use wearisk_database::risks_db;
use wearisk_weather::{
    CollectSummary, CollectorSettings, Department, ForecastSource, OpenMeteoClient,
    ProgressCallback, all_departments, collect, null_progress,
};

use crate::{ServerError, lock_db};

/// Whether the stored data must be re-collected: the file is missing or
/// older than `max_age`, or no rows are stored.
///
/// # Errors
///
/// Returns [`ServerError`] if the lock is poisoned or the query fails.
pub fn is_stale(db: &Mutex<Connection>, path: &Path, max_age: Duration) -> Result<bool, ServerError> {
    if risks_db::needs_refresh(path, max_age) {
        return Ok(true);
    }
    let conn = lock_db(db)?;
    Ok(risks_db::list_timestamps(&conn)?.is_empty())
}

/// Re-collects a fixed set of departments from one forecast source.
///
/// The source lives as long as the refresher, so its rate limiter counts
/// calls across every refresh.
pub struct Refresher<S> {
    source: S,
    departments: Vec<Department>,
    settings: CollectorSettings,
}

impl Refresher<OpenMeteoClient> {
    /// Open-Meteo client for every department.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Weather`] if the HTTP client cannot be built.
    pub fn from_config(config: &WeatherConfig) -> Result<Self, ServerError> {
        Ok(Self::new(
            OpenMeteoClient::from_config(config)?,
            all_departments(),
            CollectorSettings::from(config),
        ))
    }
}

impl<S: ForecastSource> Refresher<S> {
    #[must_use]
    pub const fn new(source: S, departments: Vec<Department>, settings: CollectorSettings) -> Self {
        Self {
            source,
            departments,
            settings,
        }
    }

    /// Collects every department and replaces the stored rows with the
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if staging, an insert, or the swap fails.
    /// Stored rows are unchanged then.
    #[allow(clippy::future_not_send)]
    pub async fn refresh(
        &self,
        db: &Mutex<Connection>,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<CollectSummary, ServerError> {
        {
            let conn = lock_db(db)?;
            risks_db::begin_staging(&conn)?;
        }

        let summary = collect(&self.source, &self.departments, &self.settings, progress, |_, rows| {
            let mut conn = lock_db(db)?;
            risks_db::insert_staged(&mut conn, rows)?;
            Ok::<(), ServerError>(())
        })
        .await?;

        let mut conn = lock_db(db)?;
        if summary.rows_saved == 0 {
            log::warn!("Refresh collected no rows, keeping stored data");
            risks_db::discard_staging(&conn)?;
        } else {
            risks_db::promote_staging(&mut conn)?;
        }
        risks_db::checkpoint(&conn)?;

        Ok(summary)
    }
}

/// Background refresh loop.
///
/// Checks staleness once at startup and, in realtime mode, again every
/// `update_check_interval_secs`. Failures are logged; the server keeps
/// serving whatever is stored.
#[allow(clippy::future_not_send)]
pub async fn refresh_task(db: Arc<Mutex<Connection>>, path: PathBuf, config: WeatherConfig) {
    let refresher = match Refresher::from_config(&config) {
        Ok(refresher) => refresher,
        Err(e) => {
            log::error!("Refresh disabled, forecast client unavailable: {e}");
            return;
        }
    };
    let max_age = Duration::from_secs(config.max_age_hours.saturating_mul(3600));

    refresh_if_stale(&db, &path, &refresher, max_age).await;

    if !config.realtime {
        log::debug!("Realtime mode disabled, no periodic refresh");
        return;
    }

    let interval = Duration::from_secs(config.update_check_interval_secs.max(1));
    log::info!("Realtime mode: checking data age every {}s", interval.as_secs());

    loop {
        tokio::time::sleep(interval).await;
        refresh_if_stale(&db, &path, &refresher, max_age).await;
    }
}

#[allow(clippy::future_not_send)]
async fn refresh_if_stale<S: ForecastSource>(
    db: &Mutex<Connection>,
    path: &Path,
    refresher: &Refresher<S>,
    max_age: Duration,
) {
    match is_stale(db, path, max_age) {
        Ok(false) => {
            log::debug!("Risk data is fresh");
            return;
        }
        Ok(true) => log::info!(
            "Risk data missing or older than {}h, refreshing",
            max_age.as_secs() / 3600
        ),
        Err(e) => {
            log::error!("Failed to check risk data age: {e}");
            return;
        }
    }

    match refresher.refresh(db, &null_progress()).await {
        Ok(summary) => log::info!(
            "Refresh complete: {} departments, {} failed, {} rows",
            summary.departments_ok,
            summary.departments_failed,
            summary.rows_saved
        ),
        Err(e) => log::error!("Refresh failed: {e}"),
    }
}
