//! MCP tool implementations.

pub mod analyze_query;
pub mod compute_breaks;
pub mod context_reset;
pub mod detect_cross_references;
pub mod fetch_endpoint;
pub mod list_endpoints;
pub mod normalize_records;
pub mod registry;
pub mod route_query;
pub mod view;

pub use registry::ToolRegistry;
