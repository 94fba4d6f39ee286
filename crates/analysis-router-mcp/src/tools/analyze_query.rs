//! `analyze_query` tool: route a turn, then fetch, normalize and merge its datasets.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::session::RoutingSessionManager;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::view::batch_view;

#[derive(Debug, Deserialize)]
struct AnalyzeParams {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    5
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "analyze_query".to_string(),
        description: Some(
            "Route a user turn, fetch the chosen or cross-referenced endpoints and merge them into the conversation context"
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "limit": { "type": "integer", "default": 5, "description": "Top points per merged dataset" }
            },
            "required": ["query"]
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<RoutingSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: AnalyzeParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let mut session = session.lock().await;
    let outcome = session.analyze(&params.query).await?;

    let datasets: Vec<Value> = outcome
        .merged
        .iter()
        .filter_map(|m| session.context().dataset(&m.endpoint_id))
        .map(|d| batch_view(&d.batch, Some(params.limit)))
        .collect();

    Ok(ToolCallResult::json(&json!({
        "routing": outcome.routing,
        "currentEndpoint": outcome.current_endpoint,
        "merged": outcome.merged,
        "errors": outcome.errors,
        "datasets": datasets,
    })))
}
