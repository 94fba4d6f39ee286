//! Endpoint registry: per-endpoint query signatures and scoring contracts.
//!
//! The registry is built once at startup and never mutated. Every entry is
//! validated on load; a malformed entry is a configuration error, not
//! something that surfaces later at query time.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::signals::normalize_query;
use crate::types::{RouterError, RouterResult};

/// Registry compiled into the binary.
const BUILTIN_ENDPOINTS: &str = include_str!("../data/endpoints.json");

/// Endpoint used when a registry file does not name one.
pub const BUILTIN_DEFAULT_ENDPOINT: &str = "analyze";

const DEFAULT_ID_FIELDS: &[&str] = &[
    "ID",
    "id",
    "areaId",
    "area_id",
    "GEOID",
    "geo_id",
    "zip_code",
    "ZIP",
    "FSA_ID",
];

const DEFAULT_NAME_FIELDS: &[&str] = &[
    "DESCRIPTION",
    "areaName",
    "area_name",
    "name",
    "NAME",
    "value_DESCRIPTION",
];

/// Tie-break weight of an endpoint.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// How to recognise queries for an endpoint and how to read its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSignature {
    pub endpoint_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub phrases: Vec<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub score_field_candidates: Vec<String>,
    #[serde(default)]
    pub target_variable_name: String,
    #[serde(default = "default_id_fields")]
    pub id_field_candidates: Vec<String>,
    #[serde(default = "default_name_fields")]
    pub name_field_candidates: Vec<String>,
}

fn default_id_fields() -> Vec<String> {
    DEFAULT_ID_FIELDS.iter().map(|s| s.to_string()).collect()
}

fn default_name_fields() -> Vec<String> {
    DEFAULT_NAME_FIELDS.iter().map(|s| s.to_string()).collect()
}

impl EndpointSignature {
    /// Create a signature with default identity candidates and no display metadata.
    pub fn new(
        endpoint_id: impl Into<String>,
        priority: Priority,
        score_field_candidates: Vec<String>,
        target_variable_name: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
            display_name: None,
            description: None,
            keywords: Vec::new(),
            phrases: Vec::new(),
            priority,
            score_field_candidates,
            target_variable_name: target_variable_name.into(),
            id_field_candidates: default_id_fields(),
            name_field_candidates: default_name_fields(),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phrases = phrases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Human-readable name, falling back to the endpoint id.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.endpoint_id)
    }

    /// Normalize signals the same way queries are, then de-duplicate in place.
    fn normalize_signals(&mut self) {
        self.keywords = dedup_signals(&self.keywords);
        self.phrases = dedup_signals(&self.phrases);
    }

    fn validate(&self) -> RouterResult<()> {
        let id = &self.endpoint_id;
        if id.trim().is_empty() {
            return Err(RouterError::Configuration(
                "endpointId must not be empty".to_string(),
            ));
        }
        if self.score_field_candidates.is_empty()
            || self.score_field_candidates.iter().any(|f| f.trim().is_empty())
        {
            return Err(RouterError::Configuration(format!(
                "endpoint '{id}': scoreFieldCandidates must be a non-empty list of field names"
            )));
        }
        if self.keywords.is_empty() && self.phrases.is_empty() {
            return Err(RouterError::Configuration(format!(
                "endpoint '{id}': at least one keyword or phrase is required"
            )));
        }
        if self.target_variable_name.trim().is_empty() {
            return Err(RouterError::Configuration(format!(
                "endpoint '{id}': targetVariableName must not be empty"
            )));
        }
        Ok(())
    }
}

fn dedup_signals(signals: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    signals
        .iter()
        .map(|s| normalize_query(s))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// On-disk registry layout: either a document with a default endpoint or a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    Document {
        #[serde(rename = "defaultEndpoint", default)]
        default_endpoint: Option<String>,
        endpoints: Vec<EndpointSignature>,
    },
    List(Vec<EndpointSignature>),
}

/// Read-only table of endpoint signatures.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    signatures: Vec<EndpointSignature>,
    index: HashMap<String, usize>,
    default_endpoint: String,
}

impl EndpointRegistry {
    /// Build a registry, validating every entry and the default endpoint.
    pub fn from_signatures(
        default_endpoint: impl Into<String>,
        signatures: Vec<EndpointSignature>,
    ) -> RouterResult<Self> {
        let default_endpoint = default_endpoint.into();
        let mut index = HashMap::with_capacity(signatures.len());
        let mut normalized = Vec::with_capacity(signatures.len());

        for mut sig in signatures {
            sig.normalize_signals();
            sig.validate()?;
            if index.contains_key(&sig.endpoint_id) {
                return Err(RouterError::Configuration(format!(
                    "duplicate endpointId '{}'",
                    sig.endpoint_id
                )));
            }
            index.insert(sig.endpoint_id.clone(), normalized.len());
            normalized.push(sig);
        }

        if !index.contains_key(&default_endpoint) {
            return Err(RouterError::Configuration(format!(
                "default endpoint '{default_endpoint}' is not registered"
            )));
        }

        tracing::debug!(
            "Endpoint registry loaded: {} endpoints, default '{}'",
            normalized.len(),
            default_endpoint
        );

        Ok(Self {
            signatures: normalized,
            index,
            default_endpoint,
        })
    }

    /// Parse a registry from JSON text.
    pub fn from_json_str(json: &str) -> RouterResult<Self> {
        let file: RegistryFile = serde_json::from_str(json).map_err(|e| {
            RouterError::Configuration(format!("malformed endpoint registry: {e}"))
        })?;

        let (default_endpoint, endpoints) = match file {
            RegistryFile::Document {
                default_endpoint,
                endpoints,
            } => (default_endpoint, endpoints),
            RegistryFile::List(endpoints) => (None, endpoints),
        };

        let default_endpoint = match default_endpoint {
            Some(id) => id,
            None if endpoints
                .iter()
                .any(|e| e.endpoint_id == BUILTIN_DEFAULT_ENDPOINT) =>
            {
                BUILTIN_DEFAULT_ENDPOINT.to_string()
            }
            None => endpoints
                .first()
                .map(|e| e.endpoint_id.clone())
                .ok_or_else(|| {
                    RouterError::Configuration("endpoint registry is empty".to_string())
                })?,
        };

        Self::from_signatures(default_endpoint, endpoints)
    }

    /// Load a registry file from disk.
    pub fn from_file(path: &Path) -> RouterResult<Self> {
        tracing::info!("Loading endpoint registry from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// The registry shipped with the crate.
    pub fn builtin() -> RouterResult<Self> {
        Self::from_json_str(BUILTIN_ENDPOINTS)
    }

    pub fn lookup(&self, endpoint_id: &str) -> RouterResult<&EndpointSignature> {
        self.get(endpoint_id)
            .ok_or_else(|| RouterError::EndpointNotFound(endpoint_id.to_string()))
    }

    pub fn get(&self, endpoint_id: &str) -> Option<&EndpointSignature> {
        self.index.get(endpoint_id).map(|&i| &self.signatures[i])
    }

    pub fn contains(&self, endpoint_id: &str) -> bool {
        self.index.contains_key(endpoint_id)
    }

    /// All signatures in load order.
    pub fn all(&self) -> &[EndpointSignature] {
        &self.signatures
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.signatures.iter().map(|s| s.endpoint_id.as_str())
    }

    pub fn default_endpoint(&self) -> &str {
        &self.default_endpoint
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(id: &str) -> EndpointSignature {
        EndpointSignature::new(
            id,
            Priority::Medium,
            vec!["score".to_string()],
            "score",
        )
        .with_keywords(["thing"])
    }

    #[test]
    fn test_builtin_registry_loads() {
        let registry = EndpointRegistry::builtin().unwrap();
        assert!(registry.len() >= 20);
        assert_eq!(registry.default_endpoint(), BUILTIN_DEFAULT_ENDPOINT);
        let strategic = registry.lookup("strategic-analysis").unwrap();
        assert_eq!(strategic.priority, Priority::High);
        assert!(!strategic.phrases.is_empty());
    }

    #[test]
    fn test_lookup_missing() {
        let registry = EndpointRegistry::from_signatures("a", vec![sig("a")]).unwrap();
        assert!(matches!(
            registry.lookup("nope"),
            Err(RouterError::EndpointNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = EndpointRegistry::from_signatures("a", vec![sig("a"), sig("a")]);
        assert!(matches!(result, Err(RouterError::Configuration(_))));
    }

    #[test]
    fn test_empty_candidates_rejected() {
        let mut bad = sig("a");
        bad.score_field_candidates.clear();
        let err = EndpointRegistry::from_signatures("a", vec![bad]).unwrap_err();
        assert!(err.to_string().contains("scoreFieldCandidates"));
    }

    #[test]
    fn test_missing_signals_rejected() {
        let bad = EndpointSignature::new("a", Priority::Low, vec!["s".to_string()], "s")
            .with_keywords(["   "]);
        let err = EndpointRegistry::from_signatures("a", vec![bad]).unwrap_err();
        assert!(err.to_string().contains("keyword or phrase"));
    }

    #[test]
    fn test_unknown_default_rejected() {
        let err = EndpointRegistry::from_signatures("zzz", vec![sig("a")]).unwrap_err();
        assert!(err.to_string().contains("zzz"));
    }

    #[test]
    fn test_signals_normalized() {
        let s = sig("a").with_keywords(["Market", "market ", "SHARE"]);
        let registry = EndpointRegistry::from_signatures("a", vec![s]).unwrap();
        assert_eq!(registry.all()[0].keywords, vec!["market", "share"]);
    }

    #[test]
    fn test_punctuated_signals_match_query_form() {
        let s = sig("price-income")
            .with_phrases(["Price/Income  Ratio", "price income ratio"])
            .with_keywords(["(affordability)", "???"]);
        let registry = EndpointRegistry::from_signatures("price-income", vec![s]).unwrap();
        let entry = registry.lookup("price-income").unwrap();
        assert_eq!(entry.phrases, vec!["price income ratio"]);
        assert_eq!(entry.keywords, vec!["affordability"]);
    }

    #[test]
    fn test_bare_list_defaults_to_first_entry() {
        let json = r#"[
            {"endpointId": "first", "keywords": ["x"], "scoreFieldCandidates": ["s"], "targetVariableName": "s"},
            {"endpointId": "second", "phrases": ["y z"], "scoreFieldCandidates": ["t"], "targetVariableName": "t", "priority": "high"}
        ]"#;
        let registry = EndpointRegistry::from_json_str(json).unwrap();
        assert_eq!(registry.default_endpoint(), "first");
        assert_eq!(registry.lookup("second").unwrap().priority, Priority::High);
        assert_eq!(registry.lookup("first").unwrap().priority, Priority::Medium);
    }

    #[test]
    fn test_document_missing_target_rejected() {
        let json = r#"{"defaultEndpoint": "a", "endpoints": [
            {"endpointId": "a", "keywords": ["x"], "scoreFieldCandidates": ["s"]}
        ]}"#;
        let err = EndpointRegistry::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("targetVariableName"));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("endpoints.json");
        let doc = serde_json::json!({
            "defaultEndpoint": "a",
            "endpoints": [sig("a"), sig("b")],
        });
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        let registry = EndpointRegistry::from_file(&path).unwrap();
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
