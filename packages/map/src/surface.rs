//! Capability interface of the rendering backend.
//!
//! The pipeline never talks to a map library directly. Anything that can
//! draw a department with a style, show a legend and an info panel, and
//! fit its viewport to a bounding box can implement [`MapSurface`].

use crate::region::{Bounds, Region};
use crate::renderer::{InfoPanel, Legend, RegionStyle};
use crate::timestamps::TimestampOption;

/// Severity of a status banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Informational.
    Info,
    /// Non-blocking warning.
    Warning,
}

/// A status banner message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBanner {
    /// Banner severity.
    pub level: StatusLevel,
    /// Banner text.
    pub message: String,
}

impl StatusBanner {
    /// Banner shown when live data is in use.
    #[must_use]
    pub fn live() -> Self {
        Self {
            level: StatusLevel::Info,
            message: "Utilisation des données réelles.".to_string(),
        }
    }

    /// Banner shown when simulated data replaced live data.
    #[must_use]
    pub fn simulated(reason: &dyn std::fmt::Display) -> Self {
        Self {
            level: StatusLevel::Warning,
            message: format!("Utilisation de données simulées: {reason}"),
        }
    }
}

/// Rendering backend driven by the pipeline.
pub trait MapSurface {
    /// Applies a style to one department.
    fn render_region_style(&mut self, region: &Region, style: &RegionStyle);

    /// Replaces the legend.
    fn render_legend(&mut self, legend: &Legend);

    /// Replaces the info panel content.
    fn render_info_panel(&mut self, panel: &InfoPanel);

    /// Fits the viewport to a department.
    fn fit_bounds(&mut self, region: &Region, bounds: &Bounds);

    /// Shows or hides the loading indicator.
    fn set_loading(&mut self, loading: bool);

    /// Shows a status banner.
    fn show_status(&mut self, status: &StatusBanner);

    /// Shows the fatal load error with a retry action.
    fn show_load_error(&mut self, message: &str);

    /// Replaces the timestamp selector entries.
    fn set_timestamp_options(&mut self, options: &[TimestampOption]);
}
