//! `normalize_records` tool: normalize caller-supplied records for an endpoint.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use analysis_router::RawRecord;

use crate::session::RoutingSessionManager;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::view::batch_view;

#[derive(Debug, Deserialize)]
struct NormalizeParams {
    endpoint_id: String,
    records: Vec<RawRecord>,
    #[serde(default)]
    limit: Option<usize>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "normalize_records".to_string(),
        description: Some(
            "Normalize raw endpoint records into ranked, classified geographic data points"
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "endpoint_id": { "type": "string" },
                "records": {
                    "type": "array",
                    "items": { "type": "object" },
                    "description": "Raw records as returned by the endpoint"
                },
                "limit": { "type": "integer", "description": "Return only the top N points by rank" }
            },
            "required": ["endpoint_id", "records"]
        }),
    }
}

pub async fn execute(
    args: Value,
    session: &Arc<Mutex<RoutingSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: NormalizeParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let session = session.lock().await;
    let batch = session
        .router()
        .normalize_endpoint_data(&params.endpoint_id, &params.records)?;

    Ok(ToolCallResult::json(&batch_view(&batch, params.limit)))
}
