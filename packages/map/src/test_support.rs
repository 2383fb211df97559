//! In-memory [`RiskApi`] and fixtures shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use wearisk_risk_models::RiskRecord;
use wearisk_server_models::ApiMapData;

use crate::MapError;
use crate::api::{MetricsQuery, RiskApi};
use crate::region::Region;

/// Serves fixed regions and a queue of metrics responses.
pub struct StaticRiskApi {
    regions: Mutex<Option<Vec<Region>>>,
    metrics: Mutex<VecDeque<Result<ApiMapData, MapError>>>,
    queries: Mutex<Vec<MetricsQuery>>,
}

impl StaticRiskApi {
    pub fn new(regions: Vec<Region>) -> Self {
        Self {
            regions: Mutex::new(Some(regions)),
            metrics: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Boundaries always fail until [`Self::set_regions`] is called.
    pub fn failing_regions() -> Self {
        Self {
            regions: Mutex::new(None),
            metrics: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn set_regions(&self, regions: Vec<Region>) {
        *self.regions.lock().unwrap() = Some(regions);
    }

    pub fn push_metrics(&self, response: Result<ApiMapData, MapError>) {
        self.metrics.lock().unwrap().push_back(response);
    }

    pub fn queries(&self) -> Vec<MetricsQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn metrics_calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl RiskApi for StaticRiskApi {
    async fn fetch_regions(&self) -> Result<Vec<Region>, MapError> {
        self.regions
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| MapError::Geometry {
                message: "boundaries unavailable".to_string(),
            })
    }

    async fn fetch_metrics(&self, query: &MetricsQuery) -> Result<ApiMapData, MapError> {
        self.queries.lock().unwrap().push(query.clone());
        // An exhausted queue behaves like an unreachable server.
        self.metrics
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(MapError::Status {
                url: "http://test/api/map-data".to_string(),
                status: 503,
            }))
    }
}

pub fn map_data(records: Vec<RiskRecord>) -> ApiMapData {
    ApiMapData {
        data: Some(records),
        ..ApiMapData::default()
    }
}

pub fn record(code: &str, overall: f64) -> RiskRecord {
    RiskRecord {
        overall_risk: Some(overall),
        ..RiskRecord::empty(code)
    }
}

/// A unit-square department named after its code.
pub fn region(code: &str) -> Region {
    let geometry = geojson::Geometry::new(geojson::Value::Polygon(vec![vec![
        vec![2.0, 46.0],
        vec![3.0, 46.0],
        vec![3.0, 47.0],
        vec![2.0, 47.0],
        vec![2.0, 46.0],
    ]]));
    Region::new(code, format!("Département {code}"), geometry)
}
