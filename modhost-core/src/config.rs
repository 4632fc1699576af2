// Host settings persistence
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directory scanned for `*.lua` mods at startup
    pub mod_dir: PathBuf,
    /// Load everything in `mod_dir` once the host is ready
    pub autoload: bool,
    pub ready_poll_interval_ms: u64,
    /// Give up waiting for the host after this long; wait forever when unset
    pub ready_timeout_ms: Option<u64>,
    /// Run each mod chunk in its own global environment
    pub isolate_mod_globals: bool,
    /// Overrides Lua's `package.path` for `require` inside mods
    pub lua_package_path: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            mod_dir: Self::config_dir().join("mods"),
            autoload: true,
            ready_poll_interval_ms: 100,
            ready_timeout_ms: None,
            isolate_mod_globals: true,
            lua_package_path: None,
        }
    }
}

impl HostConfig {
    fn config_dir() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("modhost");
        path
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ready_poll_interval_ms)
    }

    pub fn ready_timeout(&self) -> Option<Duration> {
        self.ready_timeout_ms.map(Duration::from_millis)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: HostConfig = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}
