//! JSON-RPC 2.0 envelopes exchanged with the client over stdio.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Correlates a reply with its request. `Null` is only sent back when the
/// incoming line could not be parsed far enough to recover an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
    #[default]
    Null,
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::String(s) => f.write_str(s),
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Null => f.write_str("null"),
        }
    }
}

/// A call that expects exactly one reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    pub result: Value,
}

impl JsonRpcResponse {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub jsonrpc: String,
    pub id: RequestId,
    pub error: JsonRpcErrorObject,
}

impl JsonRpcError {
    pub fn new(id: RequestId, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code,
                message: message.into(),
                data: None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Fire-and-forget message such as `initialized` or a cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// One decoded line from the client.
///
/// Decoding tries variants top to bottom: a request must carry an `id`, so
/// anything with a `method` and no `id` falls through to `Notification`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    Error(JsonRpcError),
    Notification(JsonRpcNotification),
}

impl JsonRpcMessage {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            JsonRpcMessage::Request(_) => "request",
            JsonRpcMessage::Response(_) => "response",
            JsonRpcMessage::Error(_) => "error",
            JsonRpcMessage::Notification(_) => "notification",
        }
    }

    pub fn method(&self) -> Option<&str> {
        match self {
            JsonRpcMessage::Request(r) => Some(&r.method),
            JsonRpcMessage::Notification(n) => Some(&n.method),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> JsonRpcMessage {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_request_needs_id() {
        let msg = decode(json!({"jsonrpc": "2.0", "id": "q-1", "method": "tools/call"}));
        assert_eq!(msg.kind(), "request");
        assert_eq!(msg.method(), Some("tools/call"));

        let msg = decode(json!({"jsonrpc": "2.0", "method": "initialized"}));
        assert_eq!(msg.kind(), "notification");
        assert_eq!(msg.method(), Some("initialized"));
    }

    #[test]
    fn test_client_replies_have_no_method() {
        let msg = decode(json!({"jsonrpc": "2.0", "id": 3, "result": {}}));
        assert_eq!(msg.kind(), "response");
        assert!(msg.method().is_none());

        let msg = decode(json!({"jsonrpc": "2.0", "id": 3, "error": {"code": -1, "message": "x"}}));
        assert_eq!(msg.kind(), "error");
    }

    #[test]
    fn test_error_serializes_null_id() {
        let err = JsonRpcError::new(RequestId::default(), -32700, "bad line");
        let value = serde_json::to_value(err).unwrap();
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["message"], "bad line");
        assert!(value["error"].get("data").is_none());
    }
}
