//! The two fetch stages of the pipeline.
//!
//! Geometry failures are fatal to a load. Metrics failures never are:
//! they become a [`MetricsOutcome::Fallback`], and the caller substitutes
//! [`synthesize_records`] for the missing data.

use rand::Rng;
use wearisk_risk_models::{RiskRecord, RiskType};
use wearisk_server_models::ApiMapData;

use crate::MapError;
use crate::api::{MetricsQuery, RiskApi};
use crate::region::Region;
use crate::store::AvailableTimestamps;

/// Result of the metrics stage.
#[derive(Debug)]
pub enum MetricsOutcome {
    /// The server returned usable data.
    Live {
        /// Records for the requested selection.
        records: Vec<RiskRecord>,
        /// Timestamps declared by the server.
        timestamps: AvailableTimestamps,
    },
    /// Live data is unavailable; the error explains why.
    Fallback {
        /// What went wrong.
        error: MapError,
    },
}

/// Runs the geometry and metrics stages against a [`RiskApi`].
pub struct DataLoader<A> {
    api: A,
}

impl<A: RiskApi> DataLoader<A> {
    /// Creates a loader over `api`.
    pub const fn new(api: A) -> Self {
        Self { api }
    }

    /// The underlying API.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Geometry stage.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the boundaries cannot be fetched or parsed.
    pub async fn load_regions(&self) -> Result<Vec<Region>, MapError> {
        log::info!("Loading department boundaries...");
        let regions = self.api.fetch_regions().await.inspect_err(|e| {
            log::error!("Failed to load department boundaries: {e}");
        })?;
        log::info!("Loaded {} department boundaries", regions.len());
        Ok(regions)
    }

    /// Metrics stage. Never fails: any problem is reported as
    /// [`MetricsOutcome::Fallback`].
    pub async fn load_metrics(&self, query: &MetricsQuery) -> MetricsOutcome {
        let result = self
            .api
            .fetch_metrics(query)
            .await
            .and_then(validate_metrics);

        match result {
            Ok((records, timestamps)) => {
                log::info!(
                    "Loaded {} risk records ({} timestamps available)",
                    records.len(),
                    timestamps.tokens.len()
                );
                MetricsOutcome::Live {
                    records,
                    timestamps,
                }
            }
            Err(error) => {
                log::warn!("Risk metrics unavailable: {error}");
                MetricsOutcome::Fallback { error }
            }
        }
    }
}

/// Classifies a decoded metrics payload.
///
/// # Errors
///
/// Returns [`MapError::Declared`] if the payload carries an `error`
/// field, or [`MapError::EmptyMetrics`] if it has no records.
pub fn validate_metrics(
    payload: ApiMapData,
) -> Result<(Vec<RiskRecord>, AvailableTimestamps), MapError> {
    if let Some(message) = payload.error {
        return Err(MapError::Declared { message });
    }

    let records = payload
        .data
        .filter(|data| !data.is_empty())
        .ok_or(MapError::EmptyMetrics)?;

    let timestamps = AvailableTimestamps {
        tokens: payload.timestamps.unwrap_or_default(),
        current: payload.current_timestamp,
    };

    Ok((records, timestamps))
}

/// Generates one record per region with every metric drawn uniformly
/// from the integers in `[0, 100)`.
pub fn synthesize_records<R: Rng + ?Sized>(regions: &[Region], rng: &mut R) -> Vec<RiskRecord> {
    regions
        .iter()
        .map(|region| {
            let mut record = RiskRecord::empty(&region.code);
            for risk_type in RiskType::all() {
                record.set_value(*risk_type, Some(f64::from(rng.gen_range(0u8..100))));
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StaticRiskApi, map_data, record, region};
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;
    use wearisk_risk_models::TimestampSelection;

    fn query() -> MetricsQuery {
        MetricsQuery {
            risk_type: RiskType::Overall,
            timestamp: TimestampSelection::Latest,
        }
    }

    #[test]
    fn declared_error_is_a_failure() {
        let payload = ApiMapData {
            error: Some("no data collected".to_string()),
            ..map_data(vec![record("01", 50.0)])
        };
        assert!(matches!(
            validate_metrics(payload),
            Err(MapError::Declared { message }) if message == "no data collected"
        ));
    }

    #[test]
    fn empty_or_absent_data_is_a_failure() {
        assert!(matches!(
            validate_metrics(map_data(Vec::new())),
            Err(MapError::EmptyMetrics)
        ));
        assert!(matches!(
            validate_metrics(ApiMapData::default()),
            Err(MapError::EmptyMetrics)
        ));
    }

    #[test]
    fn valid_payload_yields_records_and_timestamps() {
        let payload = ApiMapData {
            timestamps: Some(vec!["t1".to_string(), "t2".to_string()]),
            current_timestamp: Some("t2".to_string()),
            ..map_data(vec![record("01", 50.0)])
        };
        let (records, timestamps) = validate_metrics(payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(timestamps.tokens, vec!["t1", "t2"]);
        assert_eq!(timestamps.current.as_deref(), Some("t2"));
    }

    #[test]
    fn synthetic_records_cover_every_region_with_integer_scores() {
        let regions: Vec<Region> = (1..=40).map(|i| region(&format!("{i:02}"))).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let records = synthesize_records(&regions, &mut rng);

        assert_eq!(records.len(), regions.len());
        for (record, region) in records.iter().zip(&regions) {
            assert_eq!(record.department_code, region.code);
            for risk_type in RiskType::all() {
                let v = record.value(*risk_type).unwrap();
                assert!((0.0..100.0).contains(&v), "{v}");
                assert!((v - v.trunc()).abs() < f64::EPSILON, "{v} is not an integer");
            }
        }
    }

    #[tokio::test]
    async fn transport_failure_becomes_fallback() {
        let api = StaticRiskApi::new(vec![region("01")]);
        api.push_metrics(Err(MapError::Status {
            url: "http://test/api/map-data".to_string(),
            status: 500,
        }));
        let loader = DataLoader::new(api);

        match loader.load_metrics(&query()).await {
            MetricsOutcome::Fallback { error } => {
                assert!(matches!(error, MapError::Status { status: 500, .. }));
            }
            MetricsOutcome::Live { .. } => panic!("expected fallback"),
        }
    }

    #[tokio::test]
    async fn geometry_failure_is_returned() {
        let api = StaticRiskApi::failing_regions();
        let loader = DataLoader::new(api);
        assert!(loader.load_regions().await.is_err());
    }
}
