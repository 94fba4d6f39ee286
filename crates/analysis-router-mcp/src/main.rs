//! Analysis router MCP server: entry point.

use std::sync::Arc;
use tokio::sync::Mutex;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use analysis_router::AnalysisRouter;
use analysis_router_mcp::config::{load_registry, RegistrySource, ServerConfig};
use analysis_router_mcp::prompts::PromptRegistry;
use analysis_router_mcp::protocol::ProtocolHandler;
use analysis_router_mcp::resources::ResourceRegistry;
use analysis_router_mcp::session::RoutingSessionManager;
use analysis_router_mcp::tools::ToolRegistry;
use analysis_router_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "analysis-router-mcp",
    about = "MCP server that routes map-and-chat queries to geographic analysis endpoints",
    version
)]
struct Cli {
    /// Path to an endpoint registry JSON file.
    #[arg(short, long, global = true)]
    registry: Option<String>,

    /// Directory holding <endpointId>.json datasets.
    #[arg(short, long, global = true)]
    data_dir: Option<String>,

    /// Seconds to wait for a dataset fetch before reporting it failed.
    #[arg(long, global = true)]
    fetch_timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Validate an endpoint registry file.
    Validate {
        /// Registry file; defaults to the resolved registry.
        path: Option<String>,
    },

    /// Print server capabilities as JSON.
    Info,

    /// Route a single query and print the result as JSON.
    Route {
        /// Query text.
        query: String,

        /// Endpoint already loaded, to also report cross-references.
        #[arg(long)]
        current: Option<String>,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   analysis-router-mcp completions bash > ~/.local/share/bash-completion/completions/analysis-router-mcp
    ///   analysis-router-mcp completions zsh > ~/.zfunc/_analysis-router-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch interactive REPL mode.
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::resolve(
        cli.registry.as_deref(),
        cli.data_dir.as_deref(),
        cli.fetch_timeout_secs,
    );

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!("Analysis router MCP server (registry: {})", config.registry);
            let session = RoutingSessionManager::open(&config)?;
            let session = Arc::new(Mutex::new(session));
            let handler = ProtocolHandler::new(session);
            let transport = StdioTransport::new(handler);
            transport.run().await?;
        }

        Commands::Validate { path } => {
            let source = path
                .map(|p| RegistrySource::File(p.into()))
                .unwrap_or_else(|| config.registry.clone());
            match load_registry(&source) {
                Ok(registry) => {
                    println!("Valid endpoint registry: {source}");
                    println!("  Endpoints: {}", registry.len());
                    println!("  Default:   {}", registry.default_endpoint());
                }
                Err(e) => {
                    eprintln!("Invalid endpoint registry: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Info => {
            let capabilities = analysis_router_mcp::types::InitializeResult::default_result();
            let tools = ToolRegistry::list_tools();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
                "resources": ResourceRegistry::list_resources().iter().map(|r| r.uri.clone()).collect::<Vec<_>>(),
                "prompts": PromptRegistry::list_prompts().iter().map(|p| p.name.clone()).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Route { query, current } => {
            let registry = load_registry(&config.registry)?;
            if let Some(current) = &current {
                registry.lookup(current)?;
            }
            let router = AnalysisRouter::new(Arc::new(registry));
            let result = router.route(&query, current.as_deref());
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(
                shell,
                &mut cmd,
                "analysis-router-mcp",
                &mut std::io::stdout(),
            );
        }

        Commands::Repl => {
            analysis_router_mcp::repl::run(config)?;
        }
    }

    Ok(())
}
