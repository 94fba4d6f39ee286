//! MCP protocol handling: JSON-RPC dispatch, negotiation and validation.

pub mod handler;
pub mod negotiation;
pub mod validator;

pub use handler::ProtocolHandler;
