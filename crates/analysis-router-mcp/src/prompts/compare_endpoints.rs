//! `compare_endpoints` prompt: guide for contrasting two merged datasets.

use serde_json::Value;

use crate::types::{McpError, McpResult, PromptGetResult, PromptMessage};

fn required<'a>(args: &'a Value, name: &str) -> McpResult<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| McpError::InvalidParams(format!("'{name}' argument is required")))
}

pub fn expand(args: Value) -> McpResult<PromptGetResult> {
    let endpoint_a = required(&args, "endpoint_a")?;
    let endpoint_b = required(&args, "endpoint_b")?;

    let text = format!(
        "Compare the '{endpoint_a}' and '{endpoint_b}' analyses.\n\n\
         Please:\n\
         1. Make sure both are loaded: read routing://context, and fetch_endpoint with merge=false for whichever is missing\n\
         2. Read routing://dataset/{endpoint_a} and routing://dataset/{endpoint_b}\n\
         3. Match areas by areaId and list those ranked in the top bucket for both\n\
         4. Point out areas that rank high on one and low on the other\n\
         5. Summarize what the two target variables say together"
    );

    Ok(PromptGetResult {
        description: Some(format!("Compare {endpoint_a} with {endpoint_b}")),
        messages: vec![PromptMessage::user(text)],
    })
}
