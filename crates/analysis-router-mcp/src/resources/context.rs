//! Resources: routing://context, routing://dataset/{id}

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::session::RoutingSessionManager;
use crate::tools::view::batch_view;
use crate::types::{McpError, McpResult, ReadResourceResult, ResourceContent};

pub async fn read_context(
    session: &Arc<Mutex<RoutingSessionManager>>,
) -> McpResult<ReadResourceResult> {
    let session = session.lock().await;
    let summary = session.context().summary();

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json("routing://context", &summary)],
    })
}

pub async fn read_dataset(
    endpoint_id: &str,
    session: &Arc<Mutex<RoutingSessionManager>>,
) -> McpResult<ReadResourceResult> {
    let session = session.lock().await;
    let uri = format!("routing://dataset/{endpoint_id}");
    let merged = session
        .context()
        .dataset(endpoint_id)
        .ok_or_else(|| McpError::ResourceNotFound(uri.clone()))?;

    Ok(ReadResourceResult {
        contents: vec![ResourceContent::json(uri, &batch_view(&merged.batch, None))],
    })
}
