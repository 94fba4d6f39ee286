//! `fetch_endpoint` tool: fetch and normalize one endpoint's dataset.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::session::RoutingSessionManager;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::view::batch_view;

#[derive(Debug, Deserialize)]
struct FetchParams {
    endpoint_id: String,
    #[serde(default = "default_merge")]
    merge: bool,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_merge() -> bool {
    true
}

fn default_limit() -> usize {
    10
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "fetch_endpoint".to_string(),
        description: Some(
            "Fetch an endpoint's dataset, normalize it and optionally make it the current endpoint"
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "endpoint_id": { "type": "string" },
                "merge": {
                    "type": "boolean",
                    "default": true,
                    "description": "Merge into the conversation context as the current endpoint"
                },
                "limit": { "type": "integer", "default": 10, "description": "Top points to return" }
            },
            "required": ["endpoint_id"]
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<RoutingSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: FetchParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let mut session = session.lock().await;
    let view = if params.merge {
        session.load_endpoint(&params.endpoint_id).await?;
        let merged = session
            .context()
            .dataset(&params.endpoint_id)
            .ok_or_else(|| McpError::InternalError("merged dataset missing".to_string()))?;
        batch_view(&merged.batch, Some(params.limit))
    } else {
        let batch = session.fetch_endpoint(&params.endpoint_id).await?;
        batch_view(&batch, Some(params.limit))
    };

    Ok(ToolCallResult::json(&json!({
        "merged": params.merge,
        "dataset": view,
    })))
}
