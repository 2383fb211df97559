//! Compile-time registry of the departments forecasts are collected for.
//!
//! The list lives in `departments.toml` at the crate root and is embedded
//! via `include_str!`.

use serde::Deserialize;

/// Number of metropolitan departments. Enforced by a test.
#[cfg(test)]
const EXPECTED_DEPARTMENT_COUNT: usize = 96;

const DEPARTMENTS_TOML: &str = include_str!("../departments.toml");

/// A department and the point its forecast is requested for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Department {
    /// INSEE department code (`"01"`, `"2A"`, ...).
    pub code: String,
    /// Display name.
    pub name: String,
    /// Forecast latitude (WGS84).
    pub latitude: f64,
    /// Forecast longitude (WGS84).
    pub longitude: f64,
}

#[derive(Deserialize)]
struct DepartmentFile {
    department: Vec<Department>,
}

/// Returns every registered department in file order.
///
/// # Panics
///
/// Panics if the embedded TOML fails to parse. It is a compile-time
/// constant, so a failure is a development error caught by the tests.
#[must_use]
pub fn all_departments() -> Vec<Department> {
    toml::de::from_str::<DepartmentFile>(DEPARTMENTS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse departments.toml: {e}"))
        .department
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_departments() {
        let departments = all_departments();
        assert_eq!(
            departments.len(),
            EXPECTED_DEPARTMENT_COUNT,
            "Expected {EXPECTED_DEPARTMENT_COUNT} departments, found {}. \
             Update EXPECTED_DEPARTMENT_COUNT after adding/removing departments.",
            departments.len()
        );
    }

    #[test]
    fn codes_are_unique() {
        let mut seen = BTreeSet::new();
        for department in all_departments() {
            assert!(
                seen.insert(department.code.clone()),
                "Duplicate department code: {}",
                department.code
            );
        }
        assert!(seen.contains("2A"));
        assert!(seen.contains("2B"));
        assert!(!seen.contains("20"));
    }

    #[test]
    fn coordinates_are_in_metropolitan_france() {
        for d in &all_departments() {
            assert!(!d.name.is_empty(), "Department {} has empty name", d.code);
            assert!(
                (41.0..=51.5).contains(&d.latitude),
                "Department {} latitude out of range: {}",
                d.code,
                d.latitude
            );
            assert!(
                (-5.5..=10.0).contains(&d.longitude),
                "Department {} longitude out of range: {}",
                d.code,
                d.longitude
            );
        }
    }
}
