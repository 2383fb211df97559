//! Timestamp selector entries.
//!
//! Tokens are opaque, but the server issues ISO-like values, so labels
//! are rendered as `DD/MM HHhMM` whenever a token parses as a date-time.

use chrono::{DateTime, Local, NaiveDateTime};
use wearisk_risk_models::TimestampSelection;

use crate::store::AvailableTimestamps;

/// Label of the entry bound to the latest data.
pub const LATEST_LABEL: &str = "Données les plus récentes";

const LABEL_FORMAT: &str = "%d/%m %Hh%M";

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// One entry of the timestamp selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampOption {
    /// Value bound to the entry.
    pub value: TimestampSelection,
    /// Displayed label.
    pub label: String,
    /// Whether the entry is the server's current timestamp.
    pub selected: bool,
}

/// Builds the selector entries: "latest" first, then one per token.
#[must_use]
pub fn timestamp_options(available: &AvailableTimestamps) -> Vec<TimestampOption> {
    let latest = TimestampOption {
        value: TimestampSelection::Latest,
        label: LATEST_LABEL.to_string(),
        selected: false,
    };

    std::iter::once(latest)
        .chain(available.tokens.iter().map(|token| TimestampOption {
            value: TimestampSelection::At(token.clone()),
            label: format_timestamp(token),
            selected: available.current.as_deref() == Some(token.as_str()),
        }))
        .collect()
}

/// Formats a token as `DD/MM HHhMM` in local time, or returns it
/// unchanged if it is not a recognizable date-time.
///
/// RFC 3339 tokens are converted to local time; naive tokens are taken as
/// local wall time already.
#[must_use]
pub fn format_timestamp(token: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return dt.with_timezone(&Local).format(LABEL_FORMAT).to_string();
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(token, fmt).ok())
        .map_or_else(
            || token.to_string(),
            |dt| dt.format(LABEL_FORMAT).to_string(),
        )
}
