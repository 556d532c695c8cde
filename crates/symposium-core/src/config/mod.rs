//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Symposium configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub table: TableConfig,
    pub run: RunConfig,
    pub delay: DelayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Number of seats in the ring
    pub seats: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Wall-clock run length in seconds
    pub duration_secs: u64,
    /// Join grace period after the stop signal, in seconds
    pub grace_secs: u64,
    /// End the run early once this many meals have been granted
    pub max_meals: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Upper bound for randomized think/eat phases, in milliseconds
    pub max_phase_delay_ms: u64,
    /// RNG seed for reproducible phase durations
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table: TableConfig { seats: 5 },
            run: RunConfig {
                duration_secs: 30,
                grace_secs: 2,
                max_meals: None,
            },
            delay: DelayConfig {
                max_phase_delay_ms: 1000,
                seed: None,
            },
        }
    }
}

impl RunConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

impl DelayConfig {
    pub fn max_phase_delay(&self) -> Duration {
        Duration::from_millis(self.max_phase_delay_ms)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("SYMPOSIUM_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("symposium")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Check that the configuration describes a runnable table
    pub fn validate(&self) -> Result<()> {
        if self.table.seats < 2 {
            return Err(Error::Config(format!(
                "ring needs at least two seats, got {}",
                self.table.seats
            )));
        }
        Ok(())
    }
}
