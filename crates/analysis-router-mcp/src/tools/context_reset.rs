//! `context_reset` tool: start a fresh conversation.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::{json, Value};

use crate::session::RoutingSessionManager;
use crate::types::{McpResult, ToolCallResult, ToolDefinition};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "context_reset".to_string(),
        description: Some(
            "Clear the current endpoint and every merged dataset".to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub async fn execute(
    _args: Value,
    session: &Arc<Mutex<RoutingSessionManager>>,
) -> McpResult<ToolCallResult> {
    let mut session = session.lock().await;
    let previous = session.context().id();
    session.context_mut().reset();

    Ok(ToolCallResult::json(&json!({
        "previousContextId": previous.to_string(),
        "contextId": session.context().id().to_string(),
        "status": "reset"
    })))
}
