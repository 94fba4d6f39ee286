//! The consumer-facing facade over routing, cross-reference detection and normalization.

use std::sync::Arc;

use crate::classifier::QueryClassifier;
use crate::cross_reference::CrossReferenceDetector;
use crate::fetch::DatasetFetcher;
use crate::normalize::RecordNormalizer;
use crate::registry::EndpointRegistry;
use crate::types::{CrossReference, NormalizedBatch, RawRecord, RouterResult, RoutingResult};

/// Routes queries to endpoints and normalizes endpoint data.
///
/// Holds the registry by `Arc`; cheap to clone and safe to share across threads.
#[derive(Debug, Clone)]
pub struct AnalysisRouter {
    registry: Arc<EndpointRegistry>,
    classifier: QueryClassifier,
    detector: CrossReferenceDetector,
    normalizer: RecordNormalizer,
}

impl AnalysisRouter {
    pub fn new(registry: Arc<EndpointRegistry>) -> Self {
        Self::with_normalizer(registry, RecordNormalizer::default())
    }

    pub fn with_normalizer(registry: Arc<EndpointRegistry>, normalizer: RecordNormalizer) -> Self {
        Self {
            classifier: QueryClassifier::new(registry.clone()),
            detector: CrossReferenceDetector::new(registry.clone()),
            registry,
            normalizer,
        }
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    pub fn normalizer(&self) -> &RecordNormalizer {
        &self.normalizer
    }

    pub fn classify_query(&self, query: &str) -> RoutingResult {
        self.classifier.classify(query)
    }

    /// Classify a query and, when an endpoint is already in context, attach
    /// cross-references to other endpoints.
    pub fn route(&self, query: &str, current_endpoint: Option<&str>) -> RoutingResult {
        let mut result = self.classifier.classify(query);
        if let Some(current) = current_endpoint {
            result.cross_references = self.detector.detect(query, current);
        }
        result
    }

    pub fn detect_cross_references(
        &self,
        query: &str,
        current_endpoint: &str,
    ) -> Vec<CrossReference> {
        self.detector.detect(query, current_endpoint)
    }

    /// Normalize an endpoint's raw records. Unknown endpoints are an error.
    pub fn normalize_endpoint_data(
        &self,
        endpoint_id: &str,
        records: &[RawRecord],
    ) -> RouterResult<NormalizedBatch> {
        let signature = self.registry.lookup(endpoint_id)?;
        Ok(self.normalizer.normalize_batch(records, signature))
    }

    /// Fetch an endpoint's dataset through the collaborator and normalize it.
    pub fn fetch_and_normalize(
        &self,
        fetcher: &dyn DatasetFetcher,
        endpoint_id: &str,
    ) -> RouterResult<NormalizedBatch> {
        let signature = self.registry.lookup(endpoint_id)?;
        let records = fetcher.fetch(endpoint_id)?;
        tracing::info!("Fetched {} records for '{}'", records.len(), endpoint_id);
        Ok(self.normalizer.normalize_batch(&records, signature))
    }
}
