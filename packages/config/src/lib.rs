#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration for the WeaRisk toolchain.
//!
//! Settings are read from a TOML file (`wearisk.toml` in the working
//! directory, or the path in `WEARISK_CONFIG`) with three sections:
//! `[server]`, `[weather]`, and `[map]`. Every field has a default, so a
//! missing file or a partial file is valid. A handful of environment
//! variables override the file afterwards (`BIND_ADDR`, `PORT`,
//! `WEARISK_REALTIME`, `WEARISK_API_URL`, `WEARISK_GEOJSON_URL`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "wearisk.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`AppConfig`].
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment override had an unparseable value.
    #[error("Invalid value for {name}: {value}")]
    Env {
        /// Variable name.
        name: String,
        /// Offending value.
        value: String,
    },
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Forecast collection settings.
    pub weather: WeatherConfig,
    /// Map client settings.
    pub map: MapConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Forecast collection and refresh settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Open-Meteo forecast endpoint.
    pub base_url: String,
    /// Keep re-checking data freshness in the background while serving.
    pub realtime: bool,
    /// Seconds between background freshness checks.
    pub update_check_interval_secs: u64,
    /// Stored data older than this many hours is re-collected.
    pub max_age_hours: u64,
    /// Departments per collection batch.
    pub batch_size: usize,
    /// Concurrent forecast requests within a batch.
    pub concurrency: usize,
    /// Seconds to pause between batches.
    pub batch_pause_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Maximum forecast calls per minute.
    pub max_calls_per_minute: usize,
    /// Maximum forecast calls per hour.
    pub max_calls_per_hour: usize,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            realtime: false,
            update_check_interval_secs: 1800,
            max_age_hours: 12,
            batch_size: 20,
            concurrency: 5,
            batch_pause_secs: 10,
            request_timeout_secs: 10,
            max_calls_per_minute: 30,
            max_calls_per_hour: 1000,
        }
    }
}

/// Map client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Initial map center as `[lat, lon]`.
    pub center: [f64; 2],
    /// Initial zoom level.
    pub zoom: u8,
    /// Base tile layer URL template.
    pub tile_url: String,
    /// Tile layer attribution.
    pub tile_attribution: String,
    /// URL of the department boundaries `GeoJSON`.
    pub geojson_url: String,
    /// URL of the risk metrics endpoint.
    pub api_url: String,
    /// Transport timeout for both fetch stages, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: [46.8, 2.5],
            zoom: 6,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            tile_attribution: "© OpenStreetMap contributors".to_string(),
            geojson_url: "https://raw.githubusercontent.com/gregoiredavid/france-geojson/master/departements.geojson".to_string(),
            api_url: "http://127.0.0.1:5000/api/map-data".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Parses a TOML document. Missing sections and fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document is malformed.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads a config file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Loads configuration the way every binary does: file from
    /// `WEARISK_CONFIG` (or [`DEFAULT_CONFIG_FILE`]), then environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file or an override is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("WEARISK_CONFIG")
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
        let mut config = Self::from_path(&path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Applies environment-style overrides from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if `PORT` or `WEARISK_REALTIME` cannot
    /// be parsed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Env {
                name: "PORT".to_string(),
                value: port.clone(),
            })?;
        }
        if let Some(realtime) = lookup("WEARISK_REALTIME") {
            self.weather.realtime = parse_bool(&realtime).ok_or_else(|| ConfigError::Env {
                name: "WEARISK_REALTIME".to_string(),
                value: realtime.clone(),
            })?;
        }
        if let Some(url) = lookup("WEARISK_API_URL") {
            self.map.api_url = url;
        }
        if let Some(url) = lookup("WEARISK_GEOJSON_URL") {
            self.map.geojson_url = url;
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
