//! Conversation context: the current endpoint and every dataset merged so far.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use analysis_router::{NormalizedBatch, RoutingResult};

/// Most recent turns kept in memory; older ones only count toward `turn_count`.
pub const MAX_RETAINED_TURNS: usize = 32;

/// Why a dataset was merged into the context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MergeReason {
    /// The best endpoint for a turn with nothing loaded yet, or an explicit fetch.
    Primary,
    /// Implicated by a follow-up query.
    CrossReference { signals: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedDataset {
    pub batch: NormalizedBatch,
    pub merged_at: DateTime<Utc>,
    pub reason: MergeReason,
}

/// One routed user turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextTurn {
    pub query: String,
    pub best_endpoint: String,
    pub fallback: bool,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ConversationContext {
    id: Uuid,
    started_at: DateTime<Utc>,
    current_endpoint: Option<String>,
    datasets: BTreeMap<String, MergedDataset>,
    turns: VecDeque<ContextTurn>,
    turn_count: usize,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            current_endpoint: None,
            datasets: BTreeMap::new(),
            turns: VecDeque::with_capacity(MAX_RETAINED_TURNS),
            turn_count: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current_endpoint(&self) -> Option<&str> {
        self.current_endpoint.as_deref()
    }

    pub fn set_current_endpoint(&mut self, endpoint_id: impl Into<String>) {
        self.current_endpoint = Some(endpoint_id.into());
    }

    pub fn record_turn(&mut self, query: &str, routing: &RoutingResult) {
        if self.turns.len() == MAX_RETAINED_TURNS {
            self.turns.pop_front();
        }
        self.turn_count += 1;
        self.turns.push_back(ContextTurn {
            query: query.to_string(),
            best_endpoint: routing.best_endpoint.clone(),
            fallback: routing.fallback,
            at: Utc::now(),
        });
    }

    /// Merge a normalized batch, replacing any earlier batch for the same endpoint.
    /// Returns true when a batch was replaced.
    pub fn merge(&mut self, batch: NormalizedBatch, reason: MergeReason) -> bool {
        let endpoint_id = batch.endpoint_id.clone();
        tracing::debug!("Merging {} points for '{}'", batch.len(), endpoint_id);
        self.datasets
            .insert(
                endpoint_id,
                MergedDataset {
                    batch,
                    merged_at: Utc::now(),
                    reason,
                },
            )
            .is_some()
    }

    pub fn contains(&self, endpoint_id: &str) -> bool {
        self.datasets.contains_key(endpoint_id)
    }

    pub fn dataset(&self, endpoint_id: &str) -> Option<&MergedDataset> {
        self.datasets.get(endpoint_id)
    }

    pub fn datasets(&self) -> impl Iterator<Item = &MergedDataset> {
        self.datasets.values()
    }

    /// Retained turns, oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &ContextTurn> {
        self.turns.iter()
    }

    /// Every turn recorded since the context started, retained or not.
    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    /// Drop all state and start a fresh conversation.
    pub fn reset(&mut self) {
        tracing::info!("Resetting conversation context {}", self.id);
        *self = Self::new();
    }

    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            context_id: self.id.to_string(),
            started_at: self.started_at,
            current_endpoint: self.current_endpoint.clone(),
            turn_count: self.turn_count,
            datasets: self
                .datasets
                .values()
                .map(|d| DatasetSummary {
                    endpoint_id: d.batch.endpoint_id.clone(),
                    target_variable: d.batch.target_variable.clone(),
                    record_count: d.batch.len(),
                    flagged_records: d.batch.flagged_records,
                    merged_at: d.merged_at,
                    reason: d.reason.clone(),
                })
                .collect(),
            last_turn: self.turns.back().cloned(),
        }
    }
}

/// Serializable overview of the context, without record payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSummary {
    pub context_id: String,
    pub started_at: DateTime<Utc>,
    pub current_endpoint: Option<String>,
    pub turn_count: usize,
    pub datasets: Vec<DatasetSummary>,
    pub last_turn: Option<ContextTurn>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub endpoint_id: String,
    pub target_variable: String,
    pub record_count: usize,
    pub flagged_records: usize,
    pub merged_at: DateTime<Utc>,
    pub reason: MergeReason,
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_router::ClassificationBreaks;

    fn batch(endpoint_id: &str) -> NormalizedBatch {
        NormalizedBatch {
            endpoint_id: endpoint_id.to_string(),
            target_variable: "score".to_string(),
            points: Vec::new(),
            breaks: ClassificationBreaks::default(),
            bucket_count: 4,
            flagged_records: 0,
        }
    }

    #[test]
    fn test_merge_replaces_same_endpoint() {
        let mut ctx = ConversationContext::new();
        assert!(!ctx.merge(batch("a"), MergeReason::Primary));
        assert!(ctx.merge(batch("a"), MergeReason::Primary));
        assert_eq!(ctx.summary().datasets.len(), 1);
    }

    #[test]
    fn test_turn_history_is_bounded() {
        let mut ctx = ConversationContext::new();
        let total = MAX_RETAINED_TURNS + 10;
        for i in 0..total {
            let routing = RoutingResult {
                ranked_endpoints: Vec::new(),
                best_endpoint: format!("e{i}"),
                cross_references: Vec::new(),
                fallback: true,
            };
            ctx.record_turn(&format!("query {i}"), &routing);
        }

        assert_eq!(ctx.turns().count(), MAX_RETAINED_TURNS);
        assert_eq!(ctx.turns().next().unwrap().query, "query 10");

        let summary = ctx.summary();
        assert_eq!(summary.turn_count, total);
        assert_eq!(summary.last_turn.unwrap().best_endpoint, format!("e{}", total - 1));
    }

    #[test]
    fn test_reset_clears_state_and_id() {
        let mut ctx = ConversationContext::new();
        let before = ctx.id();
        ctx.set_current_endpoint("a");
        ctx.merge(
            batch("b"),
            MergeReason::CrossReference {
                signals: "income".to_string(),
            },
        );
        ctx.reset();
        assert_ne!(ctx.id(), before);
        assert!(ctx.current_endpoint().is_none());
        assert!(!ctx.contains("b"));
    }
}
