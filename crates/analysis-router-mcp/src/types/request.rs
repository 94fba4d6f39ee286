//! Parameters of the `tools/call`, `resources/read` and `prompts/get` methods.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::{McpError, McpResult};

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceReadParams {
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptGetParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Decode a method's params, treating absent params as invalid.
pub fn decode_params<T: DeserializeOwned>(params: Option<Value>, method: &str) -> McpResult<T> {
    let params =
        params.ok_or_else(|| McpError::InvalidParams(format!("{method} requires params")))?;
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(format!("{method}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_tool_call() {
        let params: ToolCallParams = decode_params(
            Some(json!({"name": "route_query", "arguments": {"query": "income"}})),
            "tools/call",
        )
        .unwrap();
        assert_eq!(params.name, "route_query");
        assert_eq!(params.arguments.unwrap()["query"], "income");
    }

    #[test]
    fn test_missing_params_named_in_error() {
        let err = decode_params::<ResourceReadParams>(None, "resources/read").unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(ref m) if m.contains("resources/read")));
    }

    #[test]
    fn test_wrong_shape_is_invalid_params() {
        let err = decode_params::<PromptGetParams>(Some(json!({"arguments": {}})), "prompts/get")
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidParams(_)));
    }
}
