//! One JSON-RPC message per line, in both directions.

use serde::Serialize;

use crate::types::{JsonRpcMessage, McpError, McpResult};

/// Decode one line. Surrounding whitespace, including a stray `\r`, is ignored.
pub fn parse_message(line: &str) -> McpResult<JsonRpcMessage> {
    let line = line.trim();
    if line.is_empty() {
        return Err(McpError::ParseError("Empty message".to_string()));
    }
    serde_json::from_str(line).map_err(|e| McpError::ParseError(e.to_string()))
}

/// Encode a reply as compact JSON terminated by `\n`.
pub fn frame_message<T: Serialize>(value: &T) -> McpResult<String> {
    let mut line = serde_json::to_string(value).map_err(McpError::Json)?;
    line.push('\n');
    Ok(line)
}
