//! Result payloads the server sends back for tools, resources and prompts.
//!
//! Every tool and resource answers with JSON text; there is no binary content.

use serde::Serialize;
use serde_json::Value;

pub const JSON_MIME: &str = "application/json";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolCallResult {
    pub fn text(text: String) -> Self {
        Self {
            content: vec![ToolContent::Text { text }],
            is_error: None,
        }
    }

    /// Pretty-printed JSON payload, the shape every routing tool returns.
    pub fn json(value: &impl Serialize) -> Self {
        Self::text(serde_json::to_string_pretty(value).unwrap_or_else(|e| e.to_string()))
    }

    /// A tool-level failure the client model should see, as opposed to a protocol error.
    pub fn error(message: String) -> Self {
        Self {
            is_error: Some(true),
            ..Self::text(message)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolListResult {
    pub tools: Vec<ToolDefinition>,
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl From<Vec<ToolDefinition>> for ToolListResult {
    fn from(tools: Vec<ToolDefinition>) -> Self {
        Self {
            tools,
            next_cursor: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceContent {
    pub uri: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub text: String,
}

impl ResourceContent {
    pub fn json(uri: impl Into<String>, value: &impl Serialize) -> Self {
        Self {
            uri: uri.into(),
            mime_type: JSON_MIME.to_string(),
            text: serde_json::to_string_pretty(value).unwrap_or_default(),
        }
    }
}

/// A fixed `routing://` URI.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDefinition {
    pub uri: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A `routing://` URI with an `{id}` placeholder.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceTemplateDefinition {
    #[serde(rename = "uriTemplate")]
    pub uri_template: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceListResult {
    pub resources: Vec<ResourceDefinition>,
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl From<Vec<ResourceDefinition>> for ResourceListResult {
    fn from(resources: Vec<ResourceDefinition>) -> Self {
        Self {
            resources,
            next_cursor: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceTemplateListResult {
    #[serde(rename = "resourceTemplates")]
    pub resource_templates: Vec<ResourceTemplateDefinition>,
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl From<Vec<ResourceTemplateDefinition>> for ResourceTemplateListResult {
    fn from(resource_templates: Vec<ResourceTemplateDefinition>) -> Self {
        Self {
            resource_templates,
            next_cursor: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadResourceResult {
    pub contents: Vec<ResourceContent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<PromptArgument>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptListResult {
    pub prompts: Vec<PromptDefinition>,
    #[serde(rename = "nextCursor", skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl From<Vec<PromptDefinition>> for PromptListResult {
    fn from(prompts: Vec<PromptDefinition>) -> Self {
        Self {
            prompts,
            next_cursor: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: ToolContent,
}

impl PromptMessage {
    pub fn user(text: String) -> Self {
        Self {
            role: Role::User,
            content: ToolContent::Text { text },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptGetResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub messages: Vec<PromptMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_error_flag() {
        let ok = serde_json::to_value(ToolCallResult::json(&json!({"bestEndpoint": "analyze"})))
            .unwrap();
        assert!(ok.get("isError").is_none());
        assert_eq!(ok["content"][0]["type"], "text");

        let failed = serde_json::to_value(ToolCallResult::error("no data".into())).unwrap();
        assert_eq!(failed["isError"], true);
        assert_eq!(failed["content"][0]["text"], "no data");
    }

    #[test]
    fn test_resource_content_is_json_text() {
        let content = ResourceContent::json("routing://context", &json!({"turnCount": 0}));
        assert_eq!(content.mime_type, JSON_MIME);
        let parsed: Value = serde_json::from_str(&content.text).unwrap();
        assert_eq!(parsed["turnCount"], 0);
    }

    #[test]
    fn test_prompt_role_lowercase() {
        let value = serde_json::to_value(PromptMessage::user("narrate".into())).unwrap();
        assert_eq!(value["role"], "user");
    }
}
