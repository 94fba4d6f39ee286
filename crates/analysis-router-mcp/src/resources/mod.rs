//! MCP resource implementations.

pub mod context;
pub mod endpoints;
pub mod registry;
pub mod templates;

pub use registry::ResourceRegistry;
