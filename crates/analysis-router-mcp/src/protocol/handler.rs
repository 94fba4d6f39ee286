//! Maps MCP methods onto the routing tools, resources and prompts.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Serialize;
use serde_json::Value;

use crate::prompts::PromptRegistry;
use crate::resources::ResourceRegistry;
use crate::session::RoutingSessionManager;
use crate::tools::ToolRegistry;
use crate::types::*;

use super::negotiation::NegotiatedCapabilities;
use super::validator::validate_request;

/// Answers client messages against one shared routing session.
pub struct ProtocolHandler {
    session: Arc<Mutex<RoutingSessionManager>>,
    capabilities: Arc<Mutex<NegotiatedCapabilities>>,
}

impl ProtocolHandler {
    pub fn new(session: Arc<Mutex<RoutingSessionManager>>) -> Self {
        Self {
            session,
            capabilities: Arc::new(Mutex::new(NegotiatedCapabilities::default())),
        }
    }

    pub fn session(&self) -> &Arc<Mutex<RoutingSessionManager>> {
        &self.session
    }

    /// Returns the reply to send, or `None` for notifications and stray replies.
    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<Value> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            other => {
                tracing::warn!("Ignoring client {} message", other.kind());
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Value {
        let outcome = match validate_request(&request) {
            Ok(()) => self.dispatch(&request).await,
            Err(e) => Err(e),
        };

        let reply = match outcome {
            Ok(result) => serde_json::to_value(JsonRpcResponse::new(request.id, result)),
            Err(e) => {
                tracing::debug!("{} failed: {e}", request.method);
                serde_json::to_value(e.to_json_rpc_error(request.id))
            }
        };
        reply.unwrap_or_default()
    }

    async fn dispatch(&self, request: &JsonRpcRequest) -> McpResult<Value> {
        let method = request.method.as_str();
        let params = request.params.clone();

        match method {
            "initialize" => {
                let init: InitializeParams = decode_params(params, method)?;
                let result = self.capabilities.lock().await.negotiate(init)?;
                encode(result)
            }
            "shutdown" => {
                let session = self.session.lock().await;
                let summary = session.context().summary();
                tracing::info!(
                    "Shutdown after {} turns with {} datasets merged",
                    summary.turn_count,
                    summary.datasets.len()
                );
                Ok(empty_object())
            }
            "ping" => Ok(empty_object()),

            "tools/list" => encode(ToolListResult::from(ToolRegistry::list_tools())),
            "tools/call" => {
                let call: ToolCallParams = decode_params(params, method)?;
                encode(ToolRegistry::call(&call.name, call.arguments, &self.session).await?)
            }

            "resources/list" => encode(ResourceListResult::from(ResourceRegistry::list_resources())),
            "resources/templates/list" => encode(ResourceTemplateListResult::from(
                ResourceRegistry::list_templates(),
            )),
            "resources/read" => {
                let read: ResourceReadParams = decode_params(params, method)?;
                encode(ResourceRegistry::read(&read.uri, &self.session).await?)
            }

            "prompts/list" => encode(PromptListResult::from(PromptRegistry::list_prompts())),
            "prompts/get" => {
                let get: PromptGetParams = decode_params(params, method)?;
                encode(PromptRegistry::get(&get.name, get.arguments).await?)
            }

            _ => Err(McpError::MethodNotFound(request.method.clone())),
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "initialized" | "notifications/initialized" => {
                if let Err(e) = self.capabilities.lock().await.mark_initialized() {
                    tracing::error!("Client sent initialized too early: {e}");
                }
            }
            "notifications/cancelled" | "$/cancelRequest" => {
                // Tool calls finish within the fetch timeout; nothing to abort.
                tracing::info!("Client cancelled a request");
            }
            other => tracing::debug!("Unhandled notification: {other}"),
        }
    }
}

fn encode(result: impl Serialize) -> McpResult<Value> {
    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
