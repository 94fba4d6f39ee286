//! MCP prompt implementations.

pub mod compare_endpoints;
pub mod narrate;
pub mod registry;

pub use registry::PromptRegistry;
