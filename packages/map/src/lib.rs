#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Choropleth data-binding pipeline for the WeaRisk department map.
//!
//! Loads department boundaries and risk metrics in two sequential
//! stages, merges them by department code, and drives a [`MapSurface`]
//! (the rendering backend) with per-department styles, a legend, and an
//! info panel. When live metrics are unavailable the pipeline substitutes
//! locally generated random scores and keeps rendering.
//!
//! The pieces, leaves first:
//!
//! * [`color_scale`]: threshold-to-color lookup.
//! * [`store`]: the current risk snapshot and selection.
//! * [`loader`]: the geometry and metrics fetch stages with fallback.
//! * [`renderer`]: styles, legend, and info panel content.
//! * [`controller`]: pointer and selector events.

pub mod api;
pub mod color_scale;
pub mod controller;
pub mod export;
pub mod loader;
pub mod region;
pub mod renderer;
pub mod store;
pub mod surface;
pub mod timestamps;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{HttpRiskApi, MetricsQuery, RiskApi};
pub use color_scale::{ColorScale, Rgb};
pub use controller::{InteractionController, MapContext, RefetchTicket};
pub use export::{GeoJsonSurface, MapView};
pub use loader::{DataLoader, MetricsOutcome};
pub use region::{Bounds, Region};
pub use renderer::{InfoLine, InfoPanel, Legend, LegendRow, MapRenderer, RegionStyle};
pub use store::{AvailableTimestamps, RiskDataStore, Selection};
pub use surface::{MapSurface, StatusBanner, StatusLevel};
pub use timestamps::TimestampOption;

use thiserror::Error;

/// Errors that can occur while loading map data.
#[derive(Debug, Error)]
pub enum MapError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
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

    /// The boundaries document is not a usable `GeoJSON` feature collection.
    #[error("GeoJSON error: {message}")]
    Geometry {
        /// Description of what went wrong.
        message: String,
    },

    /// The metrics payload carried an `error` field.
    #[error("{message}")]
    Declared {
        /// Message reported by the server.
        message: String,
    },

    /// The metrics payload had no records.
    #[error("No risk data available")]
    EmptyMetrics,

    /// Writing an export failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File being written.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
}
