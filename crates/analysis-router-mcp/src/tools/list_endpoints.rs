//! `list_endpoints` tool: describe the registered analysis endpoints.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use analysis_router::Priority;

use crate::session::RoutingSessionManager;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    priority: Option<Priority>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_endpoints".to_string(),
        description: Some("List registered analysis endpoints".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "priority": { "type": "string", "enum": ["low", "medium", "high"] }
            }
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<RoutingSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: ListParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let session = session.lock().await;
    let registry = session.registry();
    let endpoints: Vec<Value> = registry
        .all()
        .iter()
        .filter(|sig| params.priority.map_or(true, |p| sig.priority == p))
        .map(|sig| {
            json!({
                "endpointId": sig.endpoint_id,
                "name": sig.display_name(),
                "priority": sig.priority,
                "targetVariable": sig.target_variable_name,
                "keywords": sig.keywords.len(),
                "phrases": sig.phrases.len(),
            })
        })
        .collect();

    Ok(ToolCallResult::json(&json!({
        "defaultEndpoint": registry.default_endpoint(),
        "total": endpoints.len(),
        "endpoints": endpoints,
    })))
}
