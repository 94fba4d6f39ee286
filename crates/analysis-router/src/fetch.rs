//! Dataset fetch collaborator interface.
//!
//! Retrieval of raw endpoint datasets lives outside this crate. Callers plug
//! in an implementation; failures are surfaced unchanged and never retried here.

use std::collections::HashMap;

use crate::types::{RawRecord, RouterError, RouterResult};

/// Source of raw endpoint datasets.
pub trait DatasetFetcher: Send + Sync {
    /// Return the complete raw record set for an endpoint.
    fn fetch(&self, endpoint_id: &str) -> RouterResult<Vec<RawRecord>>;
}

/// Fetcher serving datasets held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    datasets: HashMap<String, Vec<RawRecord>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, endpoint_id: impl Into<String>, records: Vec<RawRecord>) {
        self.datasets.insert(endpoint_id.into(), records);
    }

    pub fn with_dataset(mut self, endpoint_id: impl Into<String>, records: Vec<RawRecord>) -> Self {
        self.insert(endpoint_id, records);
        self
    }
}

impl DatasetFetcher for MemoryFetcher {
    fn fetch(&self, endpoint_id: &str) -> RouterResult<Vec<RawRecord>> {
        self.datasets
            .get(endpoint_id)
            .cloned()
            .ok_or_else(|| RouterError::Fetch {
                endpoint: endpoint_id.to_string(),
                message: "no dataset loaded".to_string(),
            })
    }
}

/// Parse a dataset payload: a JSON array of records, or an object wrapping one
/// under `results`, `records` or `data`. Non-object entries are rejected.
pub fn parse_dataset(endpoint_id: &str, json: &str) -> RouterResult<Vec<RawRecord>> {
    let fail = |message: String| RouterError::Fetch {
        endpoint: endpoint_id.to_string(),
        message,
    };

    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| fail(format!("invalid JSON: {e}")))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => ["results", "records", "data"]
            .iter()
            .find_map(|key| match obj.remove(*key) {
                Some(serde_json::Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| fail("expected a `results`, `records` or `data` array".to_string()))?,
        _ => return Err(fail("expected an array of records".to_string())),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(fail(format!("record {i} is not an object: {other}"))),
        })
        .collect()
}
