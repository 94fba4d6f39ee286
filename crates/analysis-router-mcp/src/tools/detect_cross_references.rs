//! `detect_cross_references` tool: find other endpoints a follow-up query implicates.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::session::RoutingSessionManager;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct CrossReferenceParams {
    query: String,
    #[serde(default)]
    current_endpoint: Option<String>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "detect_cross_references".to_string(),
        description: Some(
            "List endpoints other than the current one that a follow-up query refers to"
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "current_endpoint": {
                    "type": "string",
                    "description": "Defaults to the context's current endpoint"
                }
            },
            "required": ["query"]
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<RoutingSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: CrossReferenceParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let session = session.lock().await;
    let current = params
        .current_endpoint
        .as_deref()
        .or_else(|| session.context().current_endpoint())
        .ok_or_else(|| {
            McpError::InvalidParams(
                "current_endpoint is required when no endpoint is loaded".to_string(),
            )
        })?
        .to_string();
    session.registry().lookup(&current)?;

    let cross_references = session
        .router()
        .detect_cross_references(&params.query, &current);

    Ok(ToolCallResult::json(&json!({
        "currentEndpoint": current,
        "crossReferences": cross_references,
    })))
}
