#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web metrics server for the WeaRisk department map.
//!
//! Serves per-department risk scores from the `DuckDB` risk database at
//! `GET /api/map-data`, one risk type and forecast hour at a time. Keeps
//! the database fresh by re-collecting forecasts at startup when it is
//! stale and, in realtime mode, on a fixed check interval.

mod handlers;
pub mod interactive;
pub mod refresh;
pub mod timeline;

use std::sync::{Arc, Mutex, MutexGuard};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use wearisk_config::{AppConfig, ConfigError};
use wearisk_database::{DbError, paths, risks_db};
use wearisk_weather::WeatherError;

/// Errors that can occur while running the server or refreshing data.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database error.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Forecast collection error.
    #[error(transparent)]
    Weather(#[from] WeatherError),

    /// Server I/O error (bind, accept).
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the database lock.
    #[error("Database connection lock poisoned")]
    Poisoned,
}

/// Shared application state.
pub struct AppState {
    /// Risk database connection. `duckdb::Connection` is `Send` but not
    /// `Sync`, so a `Mutex` is needed. Shared with the refresh task.
    pub db: Arc<Mutex<duckdb::Connection>>,
}

/// Locks the shared connection.
///
/// # Errors
///
/// Returns [`ServerError::Poisoned`] if the lock is poisoned.
pub fn lock_db(db: &Mutex<duckdb::Connection>) -> Result<MutexGuard<'_, duckdb::Connection>, ServerError> {
    db.lock().map_err(|_| ServerError::Poisoned)
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/map-data", web::get().to(handlers::map_data)),
    );
}

/// Starts the metrics server.
///
/// Opens the risk database, spawns the refresh task, and runs the HTTP
/// server until it is stopped. This is a regular async function; the
/// caller provides the actix runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the database cannot be opened or the HTTP
/// server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: AppConfig) -> Result<(), ServerError> {
    let db_path = paths::risks_db_path();
    log::info!("Opening risk database at {}...", db_path.display());
    let db = Arc::new(Mutex::new(risks_db::open(&db_path)?));

    actix_rt::spawn(refresh::refresh_task(
        Arc::clone(&db),
        db_path,
        config.weather.clone(),
    ));

    let state = web::Data::new(AppState { db });
    let bind_addr = config.server.bind_addr;
    let port = config.server.port;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
