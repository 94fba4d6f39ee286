//! Dataset fetcher backed by a directory of `<endpointId>.json` files.

use std::path::{Path, PathBuf};

use analysis_router::{parse_dataset, DatasetFetcher, RawRecord, RouterError, RouterResult};

#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    root: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing an endpoint. Ids outside `[A-Za-z0-9_-]` never reach the filesystem.
    pub fn dataset_path(&self, endpoint_id: &str) -> Option<PathBuf> {
        let valid = !endpoint_id.is_empty()
            && endpoint_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| self.root.join(format!("{endpoint_id}.json")))
    }
}

impl DatasetFetcher for DirectoryFetcher {
    fn fetch(&self, endpoint_id: &str) -> RouterResult<Vec<RawRecord>> {
        let fail = |message: String| RouterError::Fetch {
            endpoint: endpoint_id.to_string(),
            message,
        };

        let path = self
            .dataset_path(endpoint_id)
            .ok_or_else(|| fail("invalid endpoint id".to_string()))?;

        tracing::debug!("Reading dataset {}", path.display());
        let text = std::fs::read_to_string(&path)
            .map_err(|e| fail(format!("{}: {e}", path.display())))?;

        parse_dataset(endpoint_id, &text)
    }
}
