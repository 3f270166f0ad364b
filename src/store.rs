use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::{self, DEFAULT_PLATFORM, Target};
use crate::error::HarvestError;

/// Derives the on-disk layout for downloaded targets:
/// `<base_root>/<platform>/<bounty|no_bounty>/<name>`, every segment
/// sanitized. Paths are a pure function of the descriptor fields, so repeat
/// runs land in the same directories.
#[derive(Debug, Clone)]
pub struct Store {
    base_root: Utf8PathBuf,
}

impl Store {
    pub fn new(base_root: Utf8PathBuf) -> Self {
        Self { base_root }
    }

    pub fn base_root(&self) -> &Utf8Path {
        &self.base_root
    }

    pub fn target_dir(&self, target: &Target) -> Utf8PathBuf {
        let platform = if target.platform.trim().is_empty() {
            DEFAULT_PLATFORM
        } else {
            target.platform.as_str()
        };
        self.base_root
            .join(domain::sanitize(platform))
            .join(domain::bounty_segment(target.bounty))
            .join(domain::sanitize(&target.name))
    }

    pub fn archive_path(&self, target: &Target) -> Utf8PathBuf {
        self.target_dir(target)
            .join(format!("{}.zip", domain::sanitize(&target.name)))
    }

    pub fn ensure_dir(&self, dir: &Utf8Path) -> Result<(), HarvestError> {
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| HarvestError::Filesystem(format!("create {dir}: {err}")))
    }
}
