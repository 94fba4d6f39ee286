//! Resource registration and dispatch.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::session::RoutingSessionManager;
use crate::types::{
    McpError, McpResult, ReadResourceResult, ResourceDefinition, ResourceTemplateDefinition,
};

use super::{context, endpoints, templates};

pub struct ResourceRegistry;

impl ResourceRegistry {
    pub fn list_templates() -> Vec<ResourceTemplateDefinition> {
        templates::list_templates()
    }

    pub fn list_resources() -> Vec<ResourceDefinition> {
        templates::list_resources()
    }

    pub async fn read(
        uri: &str,
        session: &Arc<Mutex<RoutingSessionManager>>,
    ) -> McpResult<ReadResourceResult> {
        if uri == "routing://endpoints" {
            endpoints::read_endpoints(session).await
        } else if uri == "routing://context" {
            context::read_context(session).await
        } else if let Some(id) = uri.strip_prefix("routing://endpoint/") {
            if id.is_empty() {
                return Err(McpError::InvalidParams("Endpoint id required".to_string()));
            }
            endpoints::read_endpoint(id, session).await
        } else if let Some(id) = uri.strip_prefix("routing://dataset/") {
            if id.is_empty() {
                return Err(McpError::InvalidParams("Endpoint id required".to_string()));
            }
            context::read_dataset(id, session).await
        } else {
            Err(McpError::ResourceNotFound(uri.to_string()))
        }
    }
}
