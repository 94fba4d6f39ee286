//! Routing session state: the router, the dataset fetcher and the conversation context.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use analysis_router::{
    AnalysisRouter, DatasetFetcher, EndpointRegistry, NormalizedBatch, RoutingResult,
};

use crate::config::{load_registry, ServerConfig};
use crate::types::{McpError, McpResult};

use super::context::{ConversationContext, MergeReason};
use super::fetcher::DirectoryFetcher;

/// Owns everything a connected client's turns operate on.
pub struct RoutingSessionManager {
    router: AnalysisRouter,
    fetcher: Option<Arc<dyn DatasetFetcher>>,
    fetch_timeout: Duration,
    context: ConversationContext,
    registry_source: String,
}

impl RoutingSessionManager {
    /// Load the registry and wire up the directory fetcher from resolved config.
    pub fn open(config: &ServerConfig) -> McpResult<Self> {
        let registry = load_registry(&config.registry)?;
        let fetcher: Option<Arc<dyn DatasetFetcher>> = match &config.data_dir {
            Some(dir) => {
                tracing::info!("Serving datasets from {}", dir.display());
                Some(Arc::new(DirectoryFetcher::new(dir)) as Arc<dyn DatasetFetcher>)
            }
            None => {
                tracing::warn!("No data directory configured; fetch tools will fail");
                None
            }
        };

        Ok(Self::new(
            AnalysisRouter::new(Arc::new(registry)),
            fetcher,
            config.fetch_timeout,
        )
        .with_registry_source(config.registry.to_string()))
    }

    pub fn new(
        router: AnalysisRouter,
        fetcher: Option<Arc<dyn DatasetFetcher>>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            router,
            fetcher,
            fetch_timeout,
            context: ConversationContext::new(),
            registry_source: "builtin".to_string(),
        }
    }

    pub fn with_registry_source(mut self, source: impl Into<String>) -> Self {
        self.registry_source = source.into();
        self
    }

    pub fn router(&self) -> &AnalysisRouter {
        &self.router
    }

    pub fn registry(&self) -> &EndpointRegistry {
        self.router.registry()
    }

    pub fn registry_source(&self) -> &str {
        &self.registry_source
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ConversationContext {
        &mut self.context
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Make an endpoint the context's current one without fetching it.
    pub fn use_endpoint(&mut self, endpoint_id: &str) -> McpResult<()> {
        self.registry().lookup(endpoint_id)?;
        self.context.set_current_endpoint(endpoint_id);
        Ok(())
    }

    /// Route against the current context endpoint unless one is given.
    pub fn route(&self, query: &str, current_endpoint: Option<&str>) -> RoutingResult {
        let current = current_endpoint.or_else(|| self.context.current_endpoint());
        self.router.route(query, current)
    }

    /// Fetch and normalize an endpoint's dataset on the blocking pool, bounded
    /// by the fetch timeout. The context is not touched.
    pub async fn fetch_endpoint(&self, endpoint_id: &str) -> McpResult<NormalizedBatch> {
        self.registry().lookup(endpoint_id)?;
        let fetcher = self.fetcher.clone().ok_or_else(|| {
            McpError::FetchFailed(format!(
                "no data directory configured, cannot fetch '{endpoint_id}'"
            ))
        })?;

        let router = self.router.clone();
        let id = endpoint_id.to_string();
        let task =
            tokio::task::spawn_blocking(move || router.fetch_and_normalize(&*fetcher, &id));

        match tokio::time::timeout(self.fetch_timeout, task).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(join_err)) => Err(McpError::InternalError(format!(
                "fetch task for '{endpoint_id}' failed: {join_err}"
            ))),
            Err(_) => {
                tracing::warn!(
                    "Fetch for '{}' timed out after {:?}",
                    endpoint_id,
                    self.fetch_timeout
                );
                Err(McpError::FetchFailed(format!(
                    "'{endpoint_id}' timed out after {}ms",
                    self.fetch_timeout.as_millis()
                )))
            }
        }
    }

    /// Fetch an endpoint and merge it into the context as the current endpoint.
    pub async fn load_endpoint(&mut self, endpoint_id: &str) -> McpResult<MergedEndpoint> {
        let batch = self.fetch_endpoint(endpoint_id).await?;
        let merged = MergedEndpoint::from_batch(&batch, MergeReason::Primary);
        self.context.merge(batch, MergeReason::Primary);
        self.context.set_current_endpoint(endpoint_id);
        Ok(merged)
    }

    /// Handle one conversational turn.
    ///
    /// With nothing loaded, the best endpoint is fetched and becomes current.
    /// Otherwise cross-referenced endpoints worth fetching are merged alongside
    /// it. A primary fetch failure is an error; cross-reference failures are
    /// reported in the outcome and leave the rest of the context intact.
    pub async fn analyze(&mut self, query: &str) -> McpResult<AnalysisOutcome> {
        let current = self.context.current_endpoint().map(str::to_string);
        let routing = self.router.route(query, current.as_deref());
        self.context.record_turn(query, &routing);

        let mut merged = Vec::new();
        let mut errors = Vec::new();

        match current {
            None => {
                merged.push(self.load_endpoint(&routing.best_endpoint).await?);
            }
            Some(_) => {
                let pending: Vec<_> = routing
                    .cross_references
                    .iter()
                    .filter(|x| x.should_fetch && !self.context.contains(&x.endpoint_id))
                    .cloned()
                    .collect();

                for xref in pending {
                    match self.fetch_endpoint(&xref.endpoint_id).await {
                        Ok(batch) => {
                            let reason = MergeReason::CrossReference {
                                signals: xref.reason.clone(),
                            };
                            merged.push(MergedEndpoint::from_batch(&batch, reason.clone()));
                            self.context.merge(batch, reason);
                        }
                        Err(e) => {
                            tracing::warn!("Cross-reference fetch failed: {e}");
                            errors.push(FetchFailure {
                                endpoint_id: xref.endpoint_id.clone(),
                                code: e.code(),
                                message: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok(AnalysisOutcome {
            routing,
            current_endpoint: self.context.current_endpoint().map(str::to_string),
            merged,
            errors,
        })
    }
}

/// What one turn of `analyze` changed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub routing: RoutingResult,
    pub current_endpoint: Option<String>,
    pub merged: Vec<MergedEndpoint>,
    pub errors: Vec<FetchFailure>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedEndpoint {
    pub endpoint_id: String,
    pub record_count: usize,
    pub flagged_records: usize,
    pub reason: MergeReason,
}

impl MergedEndpoint {
    fn from_batch(batch: &NormalizedBatch, reason: MergeReason) -> Self {
        Self {
            endpoint_id: batch.endpoint_id.clone(),
            record_count: batch.len(),
            flagged_records: batch.flagged_records,
            reason,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchFailure {
    pub endpoint_id: String,
    pub code: i32,
    pub message: String,
}
