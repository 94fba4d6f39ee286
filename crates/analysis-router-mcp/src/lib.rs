//! Analysis router MCP server: routes map-and-chat queries to analysis endpoints
//! and keeps the datasets a conversation has touched.

pub mod config;
pub mod prompts;
pub mod protocol;
pub mod repl;
pub mod resources;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::{resolve_data_dir, resolve_registry_source, ServerConfig};
pub use protocol::ProtocolHandler;
pub use session::RoutingSessionManager;
pub use transport::StdioTransport;
