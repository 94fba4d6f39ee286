//! `compute_breaks` tool: quantile breaks and legend for a list of values.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Deserialize;
use serde_json::{json, Value};

use analysis_router::{classify, compute_breaks, legend, DEFAULT_BUCKET_COUNT};

use crate::session::RoutingSessionManager;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
struct BreaksParams {
    values: Vec<f64>,
    #[serde(default = "default_buckets")]
    bucket_count: usize,
}

fn default_buckets() -> usize {
    DEFAULT_BUCKET_COUNT
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "compute_breaks".to_string(),
        description: Some(
            "Compute quartile class breaks, per-value categories and a legend".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "values": { "type": "array", "items": { "type": "number" } },
                "bucket_count": { "type": "integer", "default": 4, "minimum": 1, "maximum": 4 }
            },
            "required": ["values"]
        }),
    }
}

pub async fn execute(
    args: Value,
    _session: &Arc<Mutex<RoutingSessionManager>>,
) -> McpResult<ToolCallResult> {
    let params: BreaksParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    if params.values.iter().any(|v| !v.is_finite()) {
        return Err(McpError::InvalidParams("values must be finite".to_string()));
    }

    let breaks = compute_breaks(&params.values);
    let categories: Vec<usize> = params
        .values
        .iter()
        .map(|v| classify(*v, &breaks, params.bucket_count))
        .collect();

    Ok(ToolCallResult::json(&json!({
        "breaks": breaks,
        "categories": categories,
        "legend": legend(&breaks, &params.values, params.bucket_count),
    })))
}
