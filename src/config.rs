use std::time::Duration;

use camino::Utf8PathBuf;
use directories::BaseDirs;

use crate::error::HarvestError;

pub const DEFAULT_INDEX_URL: &str = "https://chaos-data.projectdiscovery.io/index.json";

/// Process-wide constants resolved once at startup and passed down, so the
/// components below stay testable with injected paths and URLs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub index_url: String,
    pub base_root: Utf8PathBuf,
    pub workers: usize,
    pub http_timeout: Option<Duration>,
}

impl Settings {
    pub fn resolve(
        index_url: Option<String>,
        base_root: Option<Utf8PathBuf>,
        workers: Option<usize>,
        http_timeout: Option<Duration>,
    ) -> Result<Self, HarvestError> {
        let base_root = match base_root {
            Some(root) => root,
            None => default_base_root()?,
        };
        Ok(Self {
            index_url: index_url.unwrap_or_else(|| DEFAULT_INDEX_URL.to_string()),
            base_root,
            workers: workers.unwrap_or_else(default_workers).max(1),
            http_timeout,
        })
    }
}

pub fn default_base_root() -> Result<Utf8PathBuf, HarvestError> {
    BaseDirs::new()
        .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.home_dir().join("subdomains")).ok())
        .ok_or(HarvestError::HomeDir)
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1)
}
