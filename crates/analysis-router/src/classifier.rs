//! Query classification: pick the endpoint that best answers a free-text query.

use std::sync::Arc;

use crate::registry::{EndpointRegistry, EndpointSignature};
use crate::signals::{normalize_query, scan};
use crate::types::{RankedEndpoint, RoutingResult};

/// Scores queries against every registered endpoint signature.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    registry: Arc<EndpointRegistry>,
}

impl QueryClassifier {
    pub fn new(registry: Arc<EndpointRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Score a query against a single signature.
    ///
    /// Returns the aggregate score and the matched signals, phrases first.
    pub fn score(&self, query: &str, signature: &EndpointSignature) -> (u32, Vec<String>) {
        let matched = scan(&normalize_query(query), signature);
        (matched.score(signature.priority), matched.signals())
    }

    /// Rank all endpoints for a query and choose the best one.
    ///
    /// Ordering is score descending, then endpoint id ascending. When nothing
    /// matches, the registry's default endpoint is returned with `fallback` set.
    pub fn classify(&self, query: &str) -> RoutingResult {
        let normalized = normalize_query(query);

        let mut ranked: Vec<RankedEndpoint> = self
            .registry
            .all()
            .iter()
            .filter_map(|sig| {
                let matched = scan(&normalized, sig);
                let score = matched.score(sig.priority);
                (score > 0).then(|| RankedEndpoint {
                    endpoint_id: sig.endpoint_id.clone(),
                    score,
                    matched_signals: matched.signals(),
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.endpoint_id.cmp(&b.endpoint_id))
        });

        let (best_endpoint, fallback) = match ranked.first() {
            Some(top) => (top.endpoint_id.clone(), false),
            None => {
                let default = self.registry.default_endpoint().to_string();
                tracing::info!(
                    "Routing fallback: no endpoint matched query {:?}, using default '{}'",
                    query,
                    default
                );
                (default, true)
            }
        };

        tracing::debug!(
            "Routed query to '{}' ({} candidate endpoints)",
            best_endpoint,
            ranked.len()
        );

        RoutingResult {
            ranked_endpoints: ranked,
            best_endpoint,
            cross_references: Vec::new(),
            fallback,
        }
    }
}
