//! Core data types for routing results and normalized geographic records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::quantile::ClassificationBreaks;

/// A raw dataset record: a flat mapping of field names to scalars or nulls.
pub type RawRecord = Map<String, Value>;

/// Property key set when no score candidate could be read from a record.
pub const SCORE_EXTRACTION_FAILED: &str = "scoreExtractionFailed";

/// Property key set when no identity field could be read from a record.
pub const IDENTITY_MISSING: &str = "identityMissing";

/// Property key naming the raw field the score was read from.
pub const SCORE_SOURCE_FIELD: &str = "scoreSourceField";

/// The canonical, renderer-ready unit produced for every raw record.
///
/// The score is carried three times: `value` for ranking and legends,
/// `target_variable_score` at a stable schema position, and inside
/// `properties` under the endpoint's semantic name. Consumers read all three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicDataPoint {
    pub area_id: String,
    pub area_name: String,
    pub value: f64,
    pub target_variable: String,
    pub target_variable_score: f64,
    pub rank: usize,
    pub category: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Value>,
    pub properties: Map<String, Value>,
}

impl GeographicDataPoint {
    /// Whether the score had to be defaulted because no candidate field matched.
    pub fn score_extraction_failed(&self) -> bool {
        self.properties
            .get(SCORE_EXTRACTION_FAILED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Output of normalizing one endpoint's dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBatch {
    pub endpoint_id: String,
    pub target_variable: String,
    pub points: Vec<GeographicDataPoint>,
    pub breaks: ClassificationBreaks,
    pub bucket_count: usize,
    pub flagged_records: usize,
}

impl NormalizedBatch {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points ordered by rank (best first).
    pub fn ranked(&self) -> Vec<&GeographicDataPoint> {
        let mut sorted: Vec<_> = self.points.iter().collect();
        sorted.sort_by_key(|p| p.rank);
        sorted
    }

    /// The top `limit` points by rank.
    pub fn top(&self, limit: usize) -> Vec<&GeographicDataPoint> {
        let mut ranked = self.ranked();
        ranked.truncate(limit);
        ranked
    }
}

/// One endpoint's standing for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEndpoint {
    pub endpoint_id: String,
    pub score: u32,
    pub matched_signals: Vec<String>,
}

/// An endpoint other than the current one that a follow-up query implicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReference {
    pub endpoint_id: String,
    pub reason: String,
    pub should_fetch: bool,
}

/// Transient per-query routing decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingResult {
    pub ranked_endpoints: Vec<RankedEndpoint>,
    pub best_endpoint: String,
    #[serde(default)]
    pub cross_references: Vec<CrossReference>,
    /// True when nothing matched and `best_endpoint` is the configured default.
    #[serde(default)]
    pub fallback: bool,
}

/// Errors that can occur in the routing library.
#[derive(thiserror::Error, Debug)]
pub enum RouterError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("Fetch failed for endpoint {endpoint}: {message}")]
    Fetch { endpoint: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type RouterResult<T> = Result<T, RouterError>;
