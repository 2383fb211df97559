#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Climate risk dimensions, per-department risk records, and severity levels.
//!
//! These types are shared by the metrics server (which produces risk
//! records from weather forecasts) and the map client (which colors
//! departments by them). Field names follow the JSON wire format of the
//! `/api/map-data` endpoint.

use std::convert::Infallible;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the five risk dimensions a department is scored on.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RiskType {
    /// Weighted combination of the four other dimensions.
    #[default]
    #[serde(rename = "overall_risk")]
    #[strum(serialize = "overall_risk")]
    Overall,
    /// Power line damage from gusts and humidity.
    #[serde(rename = "electrical_risk")]
    #[strum(serialize = "electrical_risk")]
    Electrical,
    /// Flooding from precipitation.
    #[serde(rename = "flood_risk")]
    #[strum(serialize = "flood_risk")]
    Flood,
    /// Heat waves.
    #[serde(rename = "heat_risk")]
    #[strum(serialize = "heat_risk")]
    Heat,
    /// Wind gusts.
    #[serde(rename = "wind_risk")]
    #[strum(serialize = "wind_risk")]
    Wind,
}

impl RiskType {
    /// Returns all variants in selector order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Overall,
            Self::Electrical,
            Self::Flood,
            Self::Heat,
            Self::Wind,
        ]
    }

    /// Returns the dimensions in the order the info panel lists them.
    #[must_use]
    pub const fn panel_order() -> &'static [Self] {
        &[
            Self::Electrical,
            Self::Flood,
            Self::Heat,
            Self::Wind,
            Self::Overall,
        ]
    }

    /// Display label used as the legend header and selector entry.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Overall => "Risque Global",
            Self::Electrical => "Risque Électrique",
            Self::Flood => "Risque d'Inondation",
            Self::Heat => "Risque de Chaleur",
            Self::Wind => "Risque de Vent",
        }
    }

    /// Label of the info panel line for this dimension.
    #[must_use]
    pub const fn panel_label(self) -> &'static str {
        match self {
            Self::Overall => "📊 Risque global",
            Self::Electrical => "⚡ Risque électrique",
            Self::Flood => "🌊 Risque d'inondation",
            Self::Heat => "🔥 Risque de chaleur",
            Self::Wind => "🌬️ Risque de vent",
        }
    }
}

/// Risk metrics for a single department at a single point in time.
///
/// Every metric is optional: an absent value is legitimate and distinct
/// from a zero score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    /// Department code (e.g. `"01"`, `"2A"`). Integer codes are accepted
    /// and kept in their decimal form.
    #[serde(deserialize_with = "department_code")]
    pub department_code: String,
    /// Electrical risk score.
    #[serde(default)]
    pub electrical_risk: Option<f64>,
    /// Flood risk score.
    #[serde(default)]
    pub flood_risk: Option<f64>,
    /// Heat risk score.
    #[serde(default)]
    pub heat_risk: Option<f64>,
    /// Wind risk score.
    #[serde(default)]
    pub wind_risk: Option<f64>,
    /// Overall risk score.
    #[serde(default)]
    pub overall_risk: Option<f64>,
}

impl RiskRecord {
    /// Creates a record with no metrics set.
    #[must_use]
    pub fn empty(department_code: impl Into<String>) -> Self {
        Self {
            department_code: department_code.into(),
            ..Self::default()
        }
    }

    /// Returns the value of the given dimension, if present.
    #[must_use]
    pub const fn value(&self, risk_type: RiskType) -> Option<f64> {
        match risk_type {
            RiskType::Overall => self.overall_risk,
            RiskType::Electrical => self.electrical_risk,
            RiskType::Flood => self.flood_risk,
            RiskType::Heat => self.heat_risk,
            RiskType::Wind => self.wind_risk,
        }
    }

    /// Sets the value of the given dimension.
    pub const fn set_value(&mut self, risk_type: RiskType, value: Option<f64>) {
        match risk_type {
            RiskType::Overall => self.overall_risk = value,
            RiskType::Electrical => self.electrical_risk = value,
            RiskType::Flood => self.flood_risk = value,
            RiskType::Heat => self.heat_risk = value,
            RiskType::Wind => self.wind_risk = value,
        }
    }
}

/// Severity class attached to a displayed risk value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum RiskSeverity {
    /// 30 or below, or no value.
    Low,
    /// Above 30.
    Medium,
    /// Above 70.
    High,
}

impl RiskSeverity {
    /// Classifies a value. Absent values are classified as [`Self::Low`].
    #[must_use]
    pub fn classify(value: Option<f64>) -> Self {
        match value {
            Some(v) if v > 70.0 => Self::High,
            Some(v) if v > 30.0 => Self::Medium,
            _ => Self::Low,
        }
    }
}

/// Which time slice of the risk data is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum TimestampSelection {
    /// The server's most recent data.
    #[default]
    Latest,
    /// An opaque timestamp token issued by the server.
    At(String),
}

impl TimestampSelection {
    /// Sentinel token used for [`Self::Latest`].
    pub const LATEST: &'static str = "latest";

    /// Returns the token to send as the `timestamp` query parameter, or
    /// `None` for [`Self::Latest`].
    #[must_use]
    pub fn query_token(&self) -> Option<&str> {
        match self {
            Self::Latest => None,
            Self::At(token) => Some(token),
        }
    }
}

impl std::fmt::Display for TimestampSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => f.write_str(Self::LATEST),
            Self::At(token) => f.write_str(token),
        }
    }
}

impl FromStr for TimestampSelection {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == Self::LATEST {
            Ok(Self::Latest)
        } else {
            Ok(Self::At(s.to_string()))
        }
    }
}

/// One hourly risk row computed from a weather forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRisk {
    /// Department code.
    pub department_code: String,
    /// Department display name.
    pub department_name: String,
    /// Forecast hour token (`YYYY-MM-DDTHH:MM`, Europe/Paris wall time).
    pub timestamp: String,
    /// Electrical risk score.
    pub electrical: f64,
    /// Flood risk score.
    pub flood: f64,
    /// Heat risk score.
    pub heat: f64,
    /// Wind risk score.
    pub wind: f64,
    /// Overall risk score, rounded to two decimals.
    pub overall: f64,
}

fn department_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Integer(i64),
    }

    Ok(match Code::deserialize(deserializer)? {
        Code::Text(code) => code.trim().to_string(),
        Code::Integer(code) => code.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_type_tokens_parse_and_display() {
        for risk_type in RiskType::all() {
            let token = risk_type.to_string();
            assert!(token.ends_with("_risk"), "{token}");
            assert_eq!(token.parse::<RiskType>().unwrap(), *risk_type);
        }
        assert!("rain_risk".parse::<RiskType>().is_err());
    }

    #[test]
    fn risk_type_serde_matches_strum() {
        let json = serde_json::to_string(&RiskType::Flood).unwrap();
        assert_eq!(json, "\"flood_risk\"");
        assert_eq!(RiskType::Flood.as_ref(), "flood_risk");
    }

    #[test]
    fn record_missing_fields_deserialize_as_none() {
        let record: RiskRecord = serde_json::from_value(serde_json::json!({
            "department_code": "01",
            "overall_risk": 85.0,
            "department_name": "Ain"
        }))
        .unwrap();
        assert_eq!(record.value(RiskType::Overall), Some(85.0));
        assert_eq!(record.value(RiskType::Heat), None);
    }

    #[test]
    fn record_accepts_integer_department_code() {
        let records: Vec<RiskRecord> = serde_json::from_value(serde_json::json!([
            { "department_code": 1, "overall_risk": 12.0 },
            { "department_code": " 2A ", "overall_risk": 40.0 },
        ]))
        .unwrap();
        assert_eq!(records[0].department_code, "1");
        assert_eq!(records[1].department_code, "2A");

        let bad: Result<RiskRecord, _> =
            serde_json::from_value(serde_json::json!({ "department_code": [1] }));
        assert!(bad.is_err());
    }

    #[test]
    fn severity_thresholds_are_strict() {
        assert_eq!(RiskSeverity::classify(Some(70.0)), RiskSeverity::Medium);
        assert_eq!(RiskSeverity::classify(Some(70.1)), RiskSeverity::High);
        assert_eq!(RiskSeverity::classify(Some(30.0)), RiskSeverity::Low);
        assert_eq!(RiskSeverity::classify(Some(30.5)), RiskSeverity::Medium);
        assert_eq!(RiskSeverity::classify(None), RiskSeverity::Low);
        assert_eq!(RiskSeverity::High.as_ref(), "high");
    }

    #[test]
    fn timestamp_selection_parses_sentinel() {
        assert_eq!(
            "latest".parse::<TimestampSelection>().unwrap(),
            TimestampSelection::Latest
        );
        let at: TimestampSelection = "2025-06-01T14:00".parse().unwrap();
        assert_eq!(at.query_token(), Some("2025-06-01T14:00"));
        assert_eq!(TimestampSelection::Latest.query_token(), None);
        assert_eq!(TimestampSelection::Latest.to_string(), "latest");
    }
}
