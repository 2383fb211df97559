//! Transport for the two remote resources: department boundaries and
//! risk metrics.
//!
//! [`RiskApi`] is the seam between the pipeline and the network;
//! [`HttpRiskApi`] is the `reqwest` implementation.

use std::time::Duration;

use wearisk_config::MapConfig;
use wearisk_risk_models::{RiskType, TimestampSelection};
use wearisk_server_models::ApiMapData;

use crate::MapError;
use crate::region::{Region, parse_regions};
use crate::store::Selection;

/// Parameters of one metrics request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsQuery {
    /// Requested risk dimension.
    pub risk_type: RiskType,
    /// Requested time slice.
    pub timestamp: TimestampSelection,
}

impl MetricsQuery {
    /// Query string pairs. `timestamp` is omitted for the latest data.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("risk_type", self.risk_type.to_string())];
        if let Some(token) = self.timestamp.query_token() {
            pairs.push(("timestamp", token.to_string()));
        }
        pairs
    }
}

impl From<&Selection> for MetricsQuery {
    fn from(selection: &Selection) -> Self {
        Self {
            risk_type: selection.risk_type,
            timestamp: selection.timestamp.clone(),
        }
    }
}

/// Source of department boundaries and risk metrics.
#[async_trait::async_trait]
pub trait RiskApi: Send + Sync {
    /// Fetches and parses the department boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] on transport failure, a non-success status, or
    /// an unusable document.
    async fn fetch_regions(&self) -> Result<Vec<Region>, MapError>;

    /// Fetches the metrics payload for `query`. The payload is returned
    /// as decoded; classifying it (declared error, empty data) is the
    /// loader's job.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] on transport failure, a non-success status, or
    /// an undecodable body.
    async fn fetch_metrics(&self, query: &MetricsQuery) -> Result<ApiMapData, MapError>;
}

/// [`RiskApi`] over HTTP.
pub struct HttpRiskApi {
    client: reqwest::Client,
    geojson_url: String,
    api_url: String,
}

impl HttpRiskApi {
    /// Creates a client for the given endpoints.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        geojson_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            geojson_url: geojson_url.into(),
            api_url: api_url.into(),
        }
    }

    /// Creates a client from the `[map]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &MapConfig) -> Result<Self, MapError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::new(client, &config.geojson_url, &config.api_url))
    }
}

#[async_trait::async_trait]
impl RiskApi for HttpRiskApi {
    async fn fetch_regions(&self) -> Result<Vec<Region>, MapError> {
        log::debug!("Fetching department boundaries from {}", self.geojson_url);
        let resp = self.client.get(&self.geojson_url).send().await?;
        if !resp.status().is_success() {
            return Err(MapError::Status {
                url: self.geojson_url.clone(),
                status: resp.status().as_u16(),
            });
        }
        let body = resp.text().await?;
        parse_regions(&body)
    }

    async fn fetch_metrics(&self, query: &MetricsQuery) -> Result<ApiMapData, MapError> {
        log::debug!("Fetching risk metrics from {} ({query:?})", self.api_url);
        let resp = self
            .client
            .get(&self.api_url)
            .query(&query.query_pairs())
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(MapError::Status {
                url: resp.url().to_string(),
                status: resp.status().as_u16(),
            });
        }
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
