//! Resources: routing://endpoints, routing://endpoint/{id}

use std::sync::Arc;
use tokio::sync::Mutex;

use serde_json::json;

use crate::session::RoutingSessionManager;
use crate::types::{McpResult, ReadResourceResult, ResourceContent};

pub async fn read_endpoints(
    session: &Arc<Mutex<RoutingSessionManager>>,
) -> McpResult<ReadResourceResult> {
    let session = session.lock().await;
    let registry = session.registry();

    let content = json!({
        "source": session.registry_source(),
        "defaultEndpoint": registry.default_endpoint(),
        "count": registry.len(),
        "endpoints": registry.all(),
    });

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json("routing://endpoints", &content)],
    })
}

pub async fn read_endpoint(
    endpoint_id: &str,
    session: &Arc<Mutex<RoutingSessionManager>>,
) -> McpResult<ReadResourceResult> {
    let session = session.lock().await;
    let signature = session.registry().lookup(endpoint_id)?;

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json(
            format!("routing://endpoint/{endpoint_id}"),
            signature,
        )],
    })
}
