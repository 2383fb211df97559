#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the WeaRisk metrics server.
//!
//! The same types are used on both sides of the wire: the server
//! serializes them and the map client deserializes them. Client-side
//! decoding is lenient (every field is optional) so that a partial or
//! error payload still decodes and can be classified by the caller.

use serde::{Deserialize, Serialize};
use wearisk_risk_models::{RiskRecord, RiskType};

/// Response body of `GET /api/map-data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiMapData {
    /// One record per department for the selected time slice.
    #[serde(default)]
    pub data: Option<Vec<RiskRecord>>,
    /// All timestamp tokens the server holds data for, ascending.
    #[serde(default)]
    pub timestamps: Option<Vec<String>>,
    /// The token `data` belongs to.
    #[serde(default)]
    pub current_timestamp: Option<String>,
    /// The risk type the request selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_type: Option<RiskType>,
    /// Set when the server could not produce data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Query parameters for `GET /api/map-data`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapDataParams {
    /// Risk type token (e.g. `overall_risk`). Defaults to overall.
    pub risk_type: Option<String>,
    /// Timestamp token, or `latest`.
    pub timestamp: Option<String>,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable description.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Number of stored timestamps.
    pub timestamp_count: usize,
}
