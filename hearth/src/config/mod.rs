use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use serde::{Deserialize, Serialize};

/// Settings of the conversation host, stored as `config.json` in the profile
/// directory. Missing keys fall back to their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Interval between two mailbox drains, in milliseconds.
    pub poll_interval_ms: u64,
    /// Name the local user's `print` lines are attributed to.
    pub profile_name: String,
    /// Stop the demo loop after this many ticks.
    pub max_ticks: Option<u64>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            profile_name: "me".to_string(),
            max_ticks: None,
        }
    }
}

impl HostConfig {
    pub const FILE_NAME: &'static str = "config.json";

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Profile directory: `HEARTH_PROFILE_DIR` when it is absolute, otherwise
    /// `hearth` under the platform config directory.
    pub fn profile_dir() -> Result<PathBuf, anyhow::Error> {
        if let Ok(custom_dir) = std::env::var("HEARTH_PROFILE_DIR") {
            let path = PathBuf::from(custom_dir);
            if path.is_absolute() {
                return Ok(path);
            } else {
                tracing::warn!("HEARTH_PROFILE_DIR is not an absolute path, using default");
            }
        }
        let base_dir = dirs::config_dir()
            .or_else(|| dirs::data_dir())
            .context("Failed to determine config directory")?;
        Ok(base_dir.join("hearth"))
    }

    pub fn default_path() -> Result<PathBuf, anyhow::Error> {
        Ok(Self::profile_dir()?.join(Self::FILE_NAME))
    }

    /// Loads the config at `path`, or the defaults if the file does not exist.
    pub async fn load(path: &Path) -> Result<Self, anyhow::Error> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let data = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        let config = serde_json::from_str(&data)
            .map_err(|e| anyhow!("Failed to parse config '{}': {}", path.display(), e))?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), anyhow::Error> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create '{}'", dir.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, data)
            .await
            .with_context(|| format!("Failed to write config '{}'", path.display()))?;
        Ok(())
    }
}
