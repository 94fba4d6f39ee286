//! Configuration loading and resolution.

use std::path::PathBuf;
use std::time::Duration;

use analysis_router::EndpointRegistry;

use crate::types::{McpError, McpResult};

/// Environment variable naming an endpoint registry file.
pub const REGISTRY_ENV: &str = "ANALYSIS_ROUTER_REGISTRY";
/// Environment variable naming the dataset directory.
pub const DATA_DIR_ENV: &str = "ANALYSIS_ROUTER_DATA_DIR";
/// Registry file picked up from the working directory when present.
pub const LOCAL_REGISTRY_PATH: &str = ".analysis-router/endpoints.json";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Where the endpoint registry comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    File(PathBuf),
    Builtin,
}

impl std::fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrySource::File(path) => write!(f, "{}", path.display()),
            RegistrySource::Builtin => write!(f, "builtin"),
        }
    }
}

/// Resolve the registry source: flag, then env, then the local file, then builtin.
pub fn resolve_registry_source(explicit: Option<&str>) -> RegistrySource {
    if let Some(path) = explicit {
        return RegistrySource::File(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var(REGISTRY_ENV) {
        if !env_path.is_empty() {
            return RegistrySource::File(PathBuf::from(env_path));
        }
    }

    let local = PathBuf::from(LOCAL_REGISTRY_PATH);
    if local.exists() {
        return RegistrySource::File(local);
    }

    RegistrySource::Builtin
}

/// Load and validate the registry. Any problem here is fatal at startup.
pub fn load_registry(source: &RegistrySource) -> McpResult<EndpointRegistry> {
    let registry = match source {
        RegistrySource::File(path) => EndpointRegistry::from_file(path),
        RegistrySource::Builtin => EndpointRegistry::builtin(),
    }
    .map_err(|e| McpError::Configuration(format!("{source}: {e}")))?;

    tracing::info!(
        "Loaded {} endpoints from {} (default '{}')",
        registry.len(),
        source,
        registry.default_endpoint()
    );
    Ok(registry)
}

/// Resolve the dataset directory: flag, then env. None disables fetching.
pub fn resolve_data_dir(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        return Some(PathBuf::from(dir));
    }

    std::env::var(DATA_DIR_ENV)
        .ok()
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
}

/// Resolved server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub registry: RegistrySource,
    pub data_dir: Option<PathBuf>,
    pub fetch_timeout: Duration,
}

impl ServerConfig {
    pub fn resolve(
        registry: Option<&str>,
        data_dir: Option<&str>,
        fetch_timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            registry: resolve_registry_source(registry),
            data_dir: resolve_data_dir(data_dir),
            fetch_timeout: Duration::from_secs(
                fetch_timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_registry_wins() {
        assert_eq!(
            resolve_registry_source(Some("/tmp/endpoints.json")),
            RegistrySource::File(PathBuf::from("/tmp/endpoints.json"))
        );
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        assert_eq!(resolve_data_dir(Some("/data")), Some(PathBuf::from("/data")));
    }

    #[test]
    fn test_load_builtin() {
        let registry = load_registry(&RegistrySource::Builtin).unwrap();
        assert_eq!(registry.default_endpoint(), "analyze");
    }

    #[test]
    fn test_load_missing_file_is_configuration_error() {
        let source = RegistrySource::File(PathBuf::from("/nonexistent/endpoints.json"));
        assert!(matches!(load_registry(&source), Err(McpError::Configuration(_))));
    }

    #[test]
    fn test_default_timeout() {
        let config = ServerConfig::resolve(Some("x.json"), Some("/d"), None);
        assert_eq!(config.fetch_timeout, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
    }
}
