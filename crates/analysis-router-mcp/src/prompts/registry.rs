//! Prompt registration and dispatch.

use serde_json::Value;

use crate::types::{McpError, McpResult, PromptArgument, PromptDefinition, PromptGetResult};

use super::{compare_endpoints, narrate};

pub struct PromptRegistry;

impl PromptRegistry {
    pub fn list_prompts() -> Vec<PromptDefinition> {
        vec![
            PromptDefinition {
                name: "narrate".to_string(),
                description: Some("Guide for narrating a normalized dataset".to_string()),
                arguments: Some(vec![
                    PromptArgument {
                        name: "endpoint_id".to_string(),
                        description: Some("Endpoint whose dataset to narrate".to_string()),
                        required: true,
                    },
                    PromptArgument {
                        name: "query".to_string(),
                        description: Some("The user's question".to_string()),
                        required: false,
                    },
                ]),
            },
            PromptDefinition {
                name: "compare_endpoints".to_string(),
                description: Some("Guide for comparing two endpoint datasets".to_string()),
                arguments: Some(vec![
                    PromptArgument {
                        name: "endpoint_a".to_string(),
                        description: Some("First endpoint ID".to_string()),
                        required: true,
                    },
                    PromptArgument {
                        name: "endpoint_b".to_string(),
                        description: Some("Second endpoint ID".to_string()),
                        required: true,
                    },
                ]),
            },
        ]
    }

    pub async fn get(name: &str, arguments: Option<Value>) -> McpResult<PromptGetResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            "narrate" => narrate::expand(args),
            "compare_endpoints" => compare_endpoints::expand(args),
            _ => Err(McpError::PromptNotFound(name.to_string())),
        }
    }
}
