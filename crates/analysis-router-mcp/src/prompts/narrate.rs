//! `narrate` prompt: guide for describing a normalized dataset to the user.

use serde_json::Value;

use crate::types::{McpError, McpResult, PromptGetResult, PromptMessage};

pub fn expand(args: Value) -> McpResult<PromptGetResult> {
    let endpoint_id = args
        .get("endpoint_id")
        .and_then(Value::as_str)
        .ok_or_else(|| McpError::InvalidParams("'endpoint_id' argument is required".to_string()))?;

    let question = args
        .get("query")
        .and_then(Value::as_str)
        .map(|q| format!("The user asked: \"{q}\"\n\n"))
        .unwrap_or_default();

    let text = format!(
        "{question}Narrate the '{endpoint_id}' analysis for the user.\n\n\
         Please:\n\
         1. Read routing://dataset/{endpoint_id} (use fetch_endpoint first if it is not loaded)\n\
         2. Name the top five areas by rank with their scores\n\
         3. Describe the legend: what separates the highest bucket from the rest\n\
         4. Mention how many records were flagged with scoreExtractionFailed, if any\n\
         5. Keep the answer grounded in the returned values; do not invent areas"
    );

    Ok(PromptGetResult {
        description: Some(format!("Narrate the {endpoint_id} dataset")),
        messages: vec![PromptMessage::user(text)],
    })
}
