//! Resource URI templates and static resource definitions.

use crate::types::{ResourceDefinition, ResourceTemplateDefinition, JSON_MIME};

pub fn list_templates() -> Vec<ResourceTemplateDefinition> {
    vec![
        ResourceTemplateDefinition {
            uri_template: "routing://endpoint/{id}".to_string(),
            name: "Endpoint Signature".to_string(),
            description: Some(
                "Matching signals and score extraction rules for one endpoint".to_string(),
            ),
            mime_type: Some(JSON_MIME.to_string()),
        },
        ResourceTemplateDefinition {
            uri_template: "routing://dataset/{id}".to_string(),
            name: "Merged Dataset".to_string(),
            description: Some(
                "Every normalized point of a dataset merged into the conversation".to_string(),
            ),
            mime_type: Some(JSON_MIME.to_string()),
        },
    ]
}

pub fn list_resources() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition {
            uri: "routing://endpoints".to_string(),
            name: "Endpoint Registry".to_string(),
            description: Some("All registered endpoints and the default route".to_string()),
            mime_type: Some(JSON_MIME.to_string()),
        },
        ResourceDefinition {
            uri: "routing://context".to_string(),
            name: "Conversation Context".to_string(),
            description: Some("Current endpoint, merged datasets and the last turn".to_string()),
            mime_type: Some(JSON_MIME.to_string()),
        },
    ]
}
