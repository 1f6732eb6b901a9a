// Configuration management

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ssh_port: u16,
    pub connect_timeout_secs: u64,
    /// Initiators stay disabled this long after a lost connection
    pub initiator_cooldown_secs: u64,
    pub tick_millis: u64,
    /// Percent the gauge moves per tick towards the reported progress
    pub progress_step: u8,
    pub log_file: PathBuf,
    pub default_username: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ssh_port: 22,
            connect_timeout_secs: 10,
            initiator_cooldown_secs: 3,
            tick_millis: 50,
            progress_step: 2,
            log_file: PathBuf::from("/tmp/dcvfix.log"),
            default_username: String::new(),
        }
    }
}

impl Config {
    /// Get default config path: ~/.config/dcvfix/config.yaml
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("dcvfix").join("config.yaml"))
    }

    /// Load config from path, falling back to defaults if not found
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = path.unwrap_or_else(|| Self::default_path().unwrap_or_default());

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_yaml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to path
    pub fn save(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.ssh_port == 0 {
            anyhow::bail!("ssh_port must be between 1 and 65535");
        }
        if self.connect_timeout_secs == 0 {
            anyhow::bail!("connect_timeout_secs must be at least 1");
        }
        if self.tick_millis == 0 || self.progress_step == 0 {
            anyhow::bail!("tick_millis and progress_step must be positive");
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn initiator_cooldown(&self) -> Duration {
        Duration::from_secs(self.initiator_cooldown_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}
