//! `collect` command: fetches forecasts for every department into a
//! fresh risk database.

use wearisk_cli_utils::{IndicatifProgress, MultiProgress};
use wearisk_config::AppConfig;
use wearisk_database::{paths, risks_db};
use wearisk_weather::{
    CollectSummary, CollectorSettings, OpenMeteoClient, all_departments, collect,
};

/// Deletes the risk database, then collects all departments into a new
/// one. Each batch is committed as soon as it is computed.
///
/// # Errors
///
/// Returns an error if the database cannot be recreated or written, or
/// the HTTP client cannot be built.
pub async fn run(
    multi: &MultiProgress,
    config: &AppConfig,
) -> Result<CollectSummary, Box<dyn std::error::Error>> {
    let path = paths::risks_db_path();
    log::info!("Recreating risk database at {}", path.display());
    risks_db::remove(&path)?;
    let mut conn = risks_db::open(&path)?;

    let client = OpenMeteoClient::from_config(&config.weather)?;
    let departments = all_departments();
    let settings = CollectorSettings::from(&config.weather);
    let progress = IndicatifProgress::departments_bar(multi, "Collecting forecasts");

    let summary = collect(&client, &departments, &settings, &progress, |_, rows| {
        risks_db::insert_risks(&mut conn, rows).map(|_| ())
    })
    .await?;

    risks_db::checkpoint(&conn)?;

    log::info!(
        "Collected {} departments ({} failed), {} rows in {} batches",
        summary.departments_ok,
        summary.departments_failed,
        summary.rows_saved,
        summary.batches
    );

    Ok(summary)
}
