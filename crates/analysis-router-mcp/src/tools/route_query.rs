//! `route_query` tool: rank endpoints for a query.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::session::RoutingSessionManager;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct RouteParams {
    query: String,
    #[serde(default)]
    current_endpoint: Option<String>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "route_query".to_string(),
        description: Some(
            "Rank analysis endpoints for a natural-language query. Never fetches data.".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "User query text" },
                "current_endpoint": {
                    "type": "string",
                    "description": "Endpoint already on screen; defaults to the context's current endpoint"
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
    let params: RouteParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let session = session.lock().await;
    if let Some(current) = &params.current_endpoint {
        session.registry().lookup(current)?;
    }

    let routing = session.route(&params.query, params.current_endpoint.as_deref());
    Ok(ToolCallResult::json(&routing))
}
