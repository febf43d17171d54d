//! Configuration for scan intervals, ranges and backend tuning.
//!
//! Stored in JSON format at `~/.portwatch/config.json`. A missing file means
//! defaults; command-line flags override individual values.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::RangeQuery;
use crate::error::{Error, Result};

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Host scan interval in seconds.
    #[serde(default = "default_host_interval", rename = "hostRefreshInterval")]
    pub host_refresh_interval: u64,

    /// Container scan interval in seconds.
    #[serde(
        default = "default_container_interval",
        rename = "containerRefreshInterval"
    )]
    pub container_refresh_interval: u64,

    /// First port of the default view range.
    #[serde(default = "default_range_start", rename = "rangeStart")]
    pub range_start: u16,

    /// Last port of the default view range.
    #[serde(default = "default_range_end", rename = "rangeEnd")]
    pub range_end: u16,

    /// Liveness check timeout for the container CLI, in seconds.
    #[serde(default = "default_probe_timeout", rename = "probeTimeout")]
    pub probe_timeout: u64,

    /// Timeout for other subprocess invocations, in seconds.
    #[serde(default = "default_command_timeout", rename = "commandTimeout")]
    pub command_timeout: u64,

    /// Wait between graceful and forceful termination, in milliseconds.
    #[serde(default = "default_kill_grace", rename = "killGracePeriod")]
    pub kill_grace_period: u64,

    /// Container runtime command-line tool.
    #[serde(default = "default_docker_binary", rename = "dockerBinary")]
    pub docker_binary: String,

    /// Use the daemon API before falling back to the CLI.
    #[serde(default = "default_true", rename = "dockerApi")]
    pub docker_api: bool,
}

fn default_host_interval() -> u64 {
    5
}

fn default_container_interval() -> u64 {
    10
}

fn default_range_start() -> u16 {
    crate::domain::reconcile::DEFAULT_RANGE.0
}

fn default_range_end() -> u16 {
    crate::domain::reconcile::DEFAULT_RANGE.1
}

fn default_probe_timeout() -> u64 {
    3
}

fn default_command_timeout() -> u64 {
    10
}

fn default_kill_grace() -> u64 {
    3000
}

fn default_docker_binary() -> String {
    "docker".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host_refresh_interval: default_host_interval(),
            container_refresh_interval: default_container_interval(),
            range_start: default_range_start(),
            range_end: default_range_end(),
            probe_timeout: default_probe_timeout(),
            command_timeout: default_command_timeout(),
            kill_grace_period: default_kill_grace(),
            docker_binary: default_docker_binary(),
            docker_api: true,
        }
    }
}

impl Config {
    pub fn host_interval(&self) -> Duration {
        Duration::from_secs(self.host_refresh_interval.max(1))
    }

    pub fn container_interval(&self) -> Duration {
        Duration::from_secs(self.container_refresh_interval.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout.max(1))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout.max(1))
    }

    pub fn kill_grace_period(&self) -> Duration {
        Duration::from_millis(self.kill_grace_period)
    }

    /// Default query built from the configured range.
    pub fn default_query(&self) -> RangeQuery {
        RangeQuery::new(self.range_start, self.range_end)
    }
}

/// Configuration store for reading and writing `config.json`.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portwatch/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".portwatch").join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &Config) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            fs::create_dir_all(config_dir)
                .await
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }
}
