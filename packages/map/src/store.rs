//! The current risk snapshot: records by department, provenance, and the
//! selected risk type and time slice.
//!
//! Records are only ever swapped as a whole, together with their
//! provenance flag, so the two can never disagree.

use std::collections::BTreeMap;

use wearisk_risk_models::{RiskRecord, RiskType, TimestampSelection};

/// The risk type and time slice being displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Selected risk dimension.
    pub risk_type: RiskType,
    /// Selected time slice.
    pub timestamp: TimestampSelection,
}

/// Timestamp tokens the server holds data for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailableTimestamps {
    /// Tokens in server order.
    pub tokens: Vec<String>,
    /// The token the last response's data belongs to.
    pub current: Option<String>,
}

/// Holds the risk snapshot for the current selection.
#[derive(Debug, Default)]
pub struct RiskDataStore {
    records: BTreeMap<String, RiskRecord>,
    selection: Selection,
    is_simulated: bool,
    timestamps: AvailableTimestamps,
}

impl RiskDataStore {
    /// Creates an empty store with the default selection (overall risk,
    /// latest data).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every record and the provenance flag at once.
    ///
    /// If `records` repeats a department code, the last occurrence wins.
    pub fn replace_records<I>(&mut self, records: I, is_simulated: bool)
    where
        I: IntoIterator<Item = RiskRecord>,
    {
        self.records = records
            .into_iter()
            .map(|record| (record.department_code.clone(), record))
            .collect();
        self.is_simulated = is_simulated;
    }

    /// Looks up the record for a department.
    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<&RiskRecord> {
        self.records.get(code)
    }

    /// Updates the selection if either field differs from the current one.
    ///
    /// Returns `true` if the selection changed.
    pub fn set_selection(&mut self, risk_type: RiskType, timestamp: TimestampSelection) -> bool {
        if self.selection.risk_type == risk_type && self.selection.timestamp == timestamp {
            return false;
        }
        self.selection = Selection {
            risk_type,
            timestamp,
        };
        true
    }

    /// The current selection.
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Whether the records were generated locally.
    #[must_use]
    pub const fn is_simulated(&self) -> bool {
        self.is_simulated
    }

    /// Number of departments with a record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over records ordered by department code.
    pub fn records(&self) -> impl Iterator<Item = &RiskRecord> {
        self.records.values()
    }

    /// Timestamps from the last successful metrics fetch.
    #[must_use]
    pub const fn available_timestamps(&self) -> &AvailableTimestamps {
        &self.timestamps
    }

    /// Replaces the available timestamps.
    pub fn set_available_timestamps(&mut self, timestamps: AvailableTimestamps) {
        self.timestamps = timestamps;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, overall: f64) -> RiskRecord {
        RiskRecord {
            overall_risk: Some(overall),
            ..RiskRecord::empty(code)
        }
    }

    #[test]
    fn replace_swaps_records_and_provenance_together() {
        let mut store = RiskDataStore::new();
        store.replace_records(vec![record("01", 10.0), record("02", 20.0)], true);
        assert!(store.is_simulated());
        assert_eq!(store.len(), 2);

        store.replace_records(vec![record("03", 30.0)], false);
        assert!(!store.is_simulated());
        assert_eq!(store.len(), 1);
        assert!(store.lookup("01").is_none());
        assert_eq!(store.lookup("03").unwrap().overall_risk, Some(30.0));
    }

    #[test]
    fn repeated_codes_keep_last_record() {
        let mut store = RiskDataStore::new();
        store.replace_records(vec![record("01", 10.0), record("01", 55.0)], false);
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("01").unwrap().overall_risk, Some(55.0));
    }

    #[test]
    fn unchanged_selection_is_not_applied() {
        let mut store = RiskDataStore::new();
        store.replace_records(vec![record("01", 10.0)], false);
        assert!(!store.set_selection(RiskType::Overall, TimestampSelection::Latest));
        assert_eq!(store.selection(), &Selection::default());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn changed_selection_is_applied() {
        let mut store = RiskDataStore::new();
        assert!(store.set_selection(RiskType::Flood, TimestampSelection::Latest));
        assert_eq!(store.selection().risk_type, RiskType::Flood);

        let at = TimestampSelection::At("2025-06-01T14:00".to_string());
        assert!(store.set_selection(RiskType::Flood, at.clone()));
        assert_eq!(store.selection().timestamp, at);
        assert!(!store.set_selection(RiskType::Flood, at));
    }
}
