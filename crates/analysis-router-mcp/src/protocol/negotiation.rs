//! MCP capability negotiation during initialization.

use crate::types::{
    ClientCapabilities, Implementation, InitializeParams, InitializeResult, McpError, McpResult,
    MCP_VERSION,
};

/// Stored client state after negotiation.
#[derive(Debug, Clone, Default)]
pub struct NegotiatedCapabilities {
    pub client: ClientCapabilities,
    pub client_info: Option<Implementation>,
    pub initialized: bool,
}

impl NegotiatedCapabilities {
    /// Answer `initialize`. Unknown protocol versions are accepted and answered
    /// with the server's version.
    pub fn negotiate(&mut self, params: InitializeParams) -> McpResult<InitializeResult> {
        if params.protocol_version != MCP_VERSION {
            tracing::warn!(
                "Client requested protocol version {}, server supports {}. Proceeding with server version.",
                params.protocol_version,
                MCP_VERSION
            );
        }

        tracing::info!(
            "Initialized with client: {} v{}",
            params.client_info.name,
            params.client_info.version
        );

        self.client = params.capabilities;
        self.client_info = Some(params.client_info);

        Ok(InitializeResult::default_result())
    }

    pub fn mark_initialized(&mut self) -> McpResult<()> {
        if self.client_info.is_none() {
            return Err(McpError::InvalidRequest(
                "'initialized' received before 'initialize'".to_string(),
            ));
        }
        self.initialized = true;
        tracing::info!("MCP handshake complete");
        Ok(())
    }
}
