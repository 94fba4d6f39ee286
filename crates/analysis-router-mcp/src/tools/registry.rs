//! Tool registration and dispatch.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::Value;

use crate::session::RoutingSessionManager;
use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{
    analyze_query, compute_breaks, context_reset, detect_cross_references, fetch_endpoint,
    list_endpoints, normalize_records, route_query,
};

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            route_query::definition(),
            normalize_records::definition(),
            detect_cross_references::definition(),
            fetch_endpoint::definition(),
            analyze_query::definition(),
            compute_breaks::definition(),
            list_endpoints::definition(),
            context_reset::definition(),
        ]
    }

    pub async fn call(
        name: &str,
        arguments: Option<Value>,
        session: &Arc<Mutex<RoutingSessionManager>>,
    ) -> McpResult<ToolCallResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));
        tracing::debug!("Tool call: {name}");

        match name {
            "route_query" => route_query::execute(args, session).await,
            "normalize_records" => normalize_records::execute(args, session).await,
            "detect_cross_references" => detect_cross_references::execute(args, session).await,
            "fetch_endpoint" => fetch_endpoint::execute(args, session).await,
            "analyze_query" => analyze_query::execute(args, session).await,
            "compute_breaks" => compute_breaks::execute(args, session).await,
            "list_endpoints" => list_endpoints::execute(args, session).await,
            "context_reset" => context_reset::execute(args, session).await,
            _ => Err(McpError::ToolNotFound(name.to_string())),
        }
    }
}
