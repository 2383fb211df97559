//! A [`MapSurface`] that records what it is told to draw and can export
//! the styled map as a `GeoJSON` `FeatureCollection`.
//!
//! The exported document carries the style of each department in its
//! feature properties (`fillColor`, `weight`, ...), which web map
//! libraries can apply directly. When a [`MapView`] is attached, the
//! collection also carries the initial view and base layer as top-level
//! `view` and `tiles` members.

use std::collections::BTreeMap;
use std::path::Path;

use geojson::{Feature, FeatureCollection, JsonObject};
use serde_json::{Value, json};
use wearisk_config::MapConfig;

use crate::MapError;
use crate::region::{Bounds, Region};
use crate::renderer::{InfoPanel, Legend, RegionStyle};
use crate::surface::{MapSurface, StatusBanner};
use crate::timestamps::TimestampOption;

/// Initial view and base layer of the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    /// Center as `[lat, lon]`.
    pub center: [f64; 2],
    /// Zoom level.
    pub zoom: u8,
    /// Tile URL template.
    pub tile_url: String,
    /// Tile attribution.
    pub tile_attribution: String,
}

impl From<&MapConfig> for MapView {
    fn from(config: &MapConfig) -> Self {
        Self {
            center: config.center,
            zoom: config.zoom,
            tile_url: config.tile_url.clone(),
            tile_attribution: config.tile_attribution.clone(),
        }
    }
}

impl MapView {
    fn foreign_members(&self) -> JsonObject {
        let mut members = JsonObject::new();
        members.insert(
            "view".to_string(),
            json!({ "center": self.center, "zoom": self.zoom }),
        );
        members.insert(
            "tiles".to_string(),
            json!({ "url": self.tile_url, "attribution": self.tile_attribution }),
        );
        members
    }
}

/// Recording surface with `GeoJSON` export.
#[derive(Debug, Default)]
pub struct GeoJsonSurface {
    view: Option<MapView>,
    styled: BTreeMap<String, (Region, RegionStyle)>,
    legend: Option<Legend>,
    info_panel: Option<InfoPanel>,
    status: Option<StatusBanner>,
    load_error: Option<String>,
    loading: bool,
    timestamp_options: Vec<TimestampOption>,
    fitted: Option<Bounds>,
}

impl GeoJsonSurface {
    /// Creates an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the view written into exports.
    #[must_use]
    pub fn with_view(mut self, view: MapView) -> Self {
        self.view = Some(view);
        self
    }

    /// The attached view.
    #[must_use]
    pub const fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    /// Last style applied to a department.
    #[must_use]
    pub fn style(&self, code: &str) -> Option<&RegionStyle> {
        self.styled.get(code).map(|(_, style)| style)
    }

    /// Number of departments that received a style.
    #[must_use]
    pub fn styled_count(&self) -> usize {
        self.styled.len()
    }

    /// Current legend.
    #[must_use]
    pub const fn legend(&self) -> Option<&Legend> {
        self.legend.as_ref()
    }

    /// Current info panel.
    #[must_use]
    pub const fn info_panel(&self) -> Option<&InfoPanel> {
        self.info_panel.as_ref()
    }

    /// Last status banner.
    #[must_use]
    pub const fn status(&self) -> Option<&StatusBanner> {
        self.status.as_ref()
    }

    /// Fatal load error, if one is showing.
    #[must_use]
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Whether the loading indicator is visible.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Timestamp selector entries.
    #[must_use]
    pub fn timestamp_options(&self) -> &[TimestampOption] {
        &self.timestamp_options
    }

    /// Last viewport fit.
    #[must_use]
    pub const fn fitted(&self) -> Option<&Bounds> {
        self.fitted.as_ref()
    }

    /// Builds a `FeatureCollection` with one feature per styled
    /// department, ordered by code.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .styled
            .values()
            .map(|(region, style)| Feature {
                bbox: None,
                geometry: Some(region.geometry.clone()),
                id: None,
                properties: Some(style_properties(region, style)),
                foreign_members: None,
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: self.view.as_ref().map(MapView::foreign_members),
        }
    }

    /// Writes [`Self::to_feature_collection`] to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Io`] if the file cannot be written.
    pub fn write_to(&self, path: &Path) -> Result<(), MapError> {
        let body = self.to_feature_collection().to_string();
        std::fs::write(path, body).map_err(|source| MapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Wrote {} styled departments to {}", self.styled.len(), path.display());
        Ok(())
    }
}

fn style_properties(region: &Region, style: &RegionStyle) -> JsonObject {
    let mut props = JsonObject::new();
    props.insert("code".to_string(), Value::from(region.code.clone()));
    props.insert("nom".to_string(), Value::from(region.name.clone()));
    props.insert("fillColor".to_string(), Value::from(style.fill_color.to_string()));
    props.insert("weight".to_string(), Value::from(style.weight));
    props.insert("opacity".to_string(), Value::from(style.opacity));
    props.insert("color".to_string(), Value::from(style.color.to_string()));
    props.insert(
        "dashArray".to_string(),
        style.dash_array.map_or(Value::Null, Value::from),
    );
    props.insert("fillOpacity".to_string(), Value::from(style.fill_opacity));
    props.insert("highlighted".to_string(), Value::from(style.is_highlighted()));
    props
}

impl MapSurface for GeoJsonSurface {
    fn render_region_style(&mut self, region: &Region, style: &RegionStyle) {
        self.styled
            .insert(region.code.clone(), (region.clone(), style.clone()));
    }

    fn render_legend(&mut self, legend: &Legend) {
        self.legend = Some(legend.clone());
    }

    fn render_info_panel(&mut self, panel: &InfoPanel) {
        self.info_panel = Some(panel.clone());
    }

    fn fit_bounds(&mut self, _region: &Region, bounds: &Bounds) {
        self.fitted = Some(*bounds);
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn show_status(&mut self, status: &StatusBanner) {
        self.status = Some(status.clone());
    }

    fn show_load_error(&mut self, message: &str) {
        self.load_error = Some(message.to_string());
    }

    fn set_timestamp_options(&mut self, options: &[TimestampOption]) {
        self.timestamp_options = options.to_vec();
    }
}
