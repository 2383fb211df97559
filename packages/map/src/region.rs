//! Department boundaries parsed from a `GeoJSON` `FeatureCollection`.
//!
//! Each feature must carry `properties.code` and `properties.nom`.
//! Geometry is kept as-is for the rendering surface; only its bounding
//! box is derived here.

use std::collections::BTreeSet;

use geo::BoundingRect as _;
use geojson::{Feature, FeatureCollection, GeoJson};

use crate::MapError;

/// Geographic bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum longitude.
    pub west: f64,
    /// Minimum latitude.
    pub south: f64,
    /// Maximum longitude.
    pub east: f64,
    /// Maximum latitude.
    pub north: f64,
}

impl Bounds {
    /// Center point as `(lon, lat)`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            f64::midpoint(self.west, self.east),
            f64::midpoint(self.south, self.north),
        )
    }
}

/// One administrative department.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Department code, unique within a region set.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Boundary geometry, handed to the rendering surface untouched.
    pub geometry: geojson::Geometry,
    /// Bounding box of `geometry`, if it has any coordinates.
    pub bounds: Option<Bounds>,
}

impl Region {
    /// Builds a region, deriving its bounds from the geometry.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, geometry: geojson::Geometry) -> Self {
        let bounds = compute_bounds(&geometry);
        Self {
            code: code.into(),
            name: name.into(),
            geometry,
            bounds,
        }
    }
}

/// Parses a `GeoJSON` `FeatureCollection` document into regions.
///
/// Features without a code, a name, or a geometry are skipped with a
/// warning, as are repeated codes (the first occurrence wins).
///
/// # Errors
///
/// Returns [`MapError::Geometry`] if the document is not a
/// `FeatureCollection`.
pub fn parse_regions(body: &str) -> Result<Vec<Region>, MapError> {
    let geojson: GeoJson = body.parse().map_err(|e| MapError::Geometry {
        message: format!("Failed to parse GeoJSON response: {e}"),
    })?;

    let collection = FeatureCollection::try_from(geojson).map_err(|e| MapError::Geometry {
        message: format!("Expected a FeatureCollection: {e}"),
    })?;

    let mut seen = BTreeSet::new();
    let mut regions = Vec::with_capacity(collection.features.len());

    for feature in collection.features {
        let Some(region) = region_from_feature(feature) else {
            continue;
        };
        if !seen.insert(region.code.clone()) {
            log::warn!("Duplicate department code {} in boundaries, skipping", region.code);
            continue;
        }
        regions.push(region);
    }

    Ok(regions)
}

fn region_from_feature(feature: Feature) -> Option<Region> {
    let code = match feature.property("code") {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => {
            log::warn!("Boundary feature without a code, skipping");
            return None;
        }
    };

    let Some(name) = feature
        .property("nom")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
    else {
        log::warn!("Boundary feature {code} without a name, skipping");
        return None;
    };

    let Some(geometry) = feature.geometry else {
        log::warn!("Boundary feature {code} without geometry, skipping");
        return None;
    };

    Some(Region::new(code, name, geometry))
}

fn compute_bounds(geometry: &geojson::Geometry) -> Option<Bounds> {
    let geo_geom: geo::Geometry<f64> = geometry.clone().try_into().ok()?;
    geo_geom.bounding_rect().map(|rect| Bounds {
        west: rect.min().x,
        south: rect.min().y,
        east: rect.max().x,
        north: rect.max().y,
    })
}
