use std::{path::Path, time::Duration};

use common::{OutputGroup, DEFAULT_PROBE_COMMANDS, MAX_GROUP_WIDTH};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "antctl.ron";

/// Overrides the config file location
pub const CONFIG_ENV: &str = "ANTCTL_CONFIG";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub port: PortConfig,
    /// Commands the probe runs when none are given on the command line
    pub commands: Vec<String>,
    pub stimulus: StimulusConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PortConfig {
    pub path: String,
    pub baud_rate: u32,
    pub timeout_ms: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StimulusConfig {
    pub groups: Vec<OutputGroup>,
    /// Pause after every command. `None` sends back to back.
    pub interval_ms: Option<u64>,
    /// Read (and log) the reply to each command before sending the next one
    pub drain_responses: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: PortConfig::default(),
            commands: DEFAULT_PROBE_COMMANDS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            stimulus: StimulusConfig::default(),
        }
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        PortConfig {
            path: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            timeout_ms: 200,
        }
    }
}

impl Default for StimulusConfig {
    fn default() -> Self {
        StimulusConfig {
            groups: OutputGroup::defaults(),
            interval_ms: None,
            drain_responses: false,
        }
    }
}

impl PortConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl StimulusConfig {
    pub fn interval(&self) -> Option<Duration> {
        self.interval_ms.map(Duration::from_millis)
    }

    /// There must be something to drive, and every mask must fit in 32 bits
    pub fn validate(&self) -> Result<(), String> {
        if self.groups.is_empty() {
            return Err("stimulus needs at least one output group".to_string());
        }

        for group in &self.groups {
            if group.width == 0 || group.width > MAX_GROUP_WIDTH {
                return Err(format!(
                    "group {} has width {}, expected 1 to {}",
                    group.tag, group.width, MAX_GROUP_WIDTH
                ));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load from `$ANTCTL_CONFIG`, or `antctl.ron` in the working directory.
    /// A missing file means the built-in defaults.
    pub fn load() -> Result<Config, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| CONFIG_FILE.to_string());
        let path = Path::new(&path);

        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        Config::load_from(path)
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let config = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = ron::from_str(&config).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config
            .stimulus
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                path: path.display().to_string(),
                reason,
            })?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Commands given on the command line win over the configured list
    pub fn resolve_commands(&self, args: Vec<String>) -> Vec<String> {
        if args.is_empty() {
            self.commands.clone()
        } else {
            args
        }
    }
}
