use crate::merge::ConflictPolicy;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
    #[serde(default = "default_true")]
    pub write_reports: bool,
    #[serde(default = "default_true")]
    pub progress: bool,
    /// Gzip output collections even without a `.gz` suffix on the output path.
    #[serde(default)]
    pub compress_output: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::default(),
            write_reports: true,
            progress: true,
            compress_output: false,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "sampledata", "sampledata-tools")
}

impl Config {
    /// Location of the user's `config.toml`, if the platform has a config directory.
    pub fn path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load the user configuration, falling back to defaults when it is absent or unreadable.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("ignoring config {}: {}", path.display(), e);
                Config::default()
            }),
            _ => Config::default(),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
