use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::domain::{DEFAULT_PLATFORM, Target};
use crate::error::HarvestError;
use crate::fetch::Fetcher;

#[derive(Debug, Deserialize)]
struct RawEntry {
    name: Option<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
    platform: Option<String>,
    bounty: Option<bool>,
}

/// Downloads the remote index document to `index_path` and parses it into
/// target descriptors. The caller owns `index_path`; this function only
/// writes and reads it.
pub fn load(
    fetcher: &dyn Fetcher,
    index_url: &str,
    index_path: &Path,
) -> Result<Vec<Target>, HarvestError> {
    fetcher
        .fetch(index_url, index_path)
        .map_err(|err| HarvestError::IndexFetch(err.to_string()))?;
    let raw =
        fs::read_to_string(index_path).map_err(|err| HarvestError::IndexFetch(err.to_string()))?;
    parse_index(&raw)
}

/// Rows missing `name` or `URL` are dropped, not errors; only a malformed
/// document fails the run.
pub fn parse_index(raw: &str) -> Result<Vec<Target>, HarvestError> {
    let entries: Vec<RawEntry> =
        serde_json::from_str(raw).map_err(|err| HarvestError::IndexParse(err.to_string()))?;
    let total = entries.len();
    let targets: Vec<Target> = entries
        .into_iter()
        .filter_map(|entry| match (entry.name, entry.url) {
            (Some(name), Some(url)) => Some(Target {
                name,
                url,
                platform: entry
                    .platform
                    .unwrap_or_else(|| DEFAULT_PLATFORM.to_string()),
                bounty: entry.bounty.unwrap_or(false),
            }),
            _ => None,
        })
        .collect();
    if targets.len() < total {
        debug!(
            dropped = total - targets.len(),
            "dropped catalog rows missing name or URL"
        );
    }
    Ok(targets)
}
