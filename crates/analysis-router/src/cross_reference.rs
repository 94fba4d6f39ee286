//! Cross-reference detection for follow-up queries.

use std::sync::Arc;

use crate::registry::{EndpointRegistry, Priority};
use crate::signals::{normalize_query, scan};
use crate::types::CrossReference;

/// Finds endpoints other than the current one that a follow-up query implicates.
#[derive(Debug, Clone)]
pub struct CrossReferenceDetector {
    registry: Arc<EndpointRegistry>,
}

impl CrossReferenceDetector {
    pub fn new(registry: Arc<EndpointRegistry>) -> Self {
        Self { registry }
    }

    /// Report every other endpoint whose signals appear in the query.
    ///
    /// `should_fetch` is set when a phrase matched or the endpoint is high
    /// priority; keyword-only hits on medium/low endpoints are informational.
    pub fn detect(&self, query: &str, current_endpoint: &str) -> Vec<CrossReference> {
        if !self.registry.contains(current_endpoint) {
            tracing::debug!("Cross-reference check against unregistered endpoint '{current_endpoint}'");
        }

        let normalized = normalize_query(query);

        let mut hits: Vec<(u32, CrossReference)> = self
            .registry
            .all()
            .iter()
            .filter(|sig| sig.endpoint_id != current_endpoint)
            .filter_map(|sig| {
                let matched = scan(&normalized, sig);
                if matched.is_empty() {
                    return None;
                }
                let should_fetch = matched.has_phrase() || sig.priority == Priority::High;
                Some((
                    matched.score(sig.priority),
                    CrossReference {
                        endpoint_id: sig.endpoint_id.clone(),
                        reason: matched.signals().join(", "),
                        should_fetch,
                    },
                ))
            })
            .collect();

        hits.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| a.endpoint_id.cmp(&b.endpoint_id)));

        let refs: Vec<CrossReference> = hits.into_iter().map(|(_, r)| r).collect();
        if !refs.is_empty() {
            tracing::debug!(
                "Query references {} other endpoints ({} to fetch) from '{}'",
                refs.len(),
                refs.iter().filter(|r| r.should_fetch).count(),
                current_endpoint
            );
        }
        refs
    }
}
