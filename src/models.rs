//! Configuration file model

use std::{
    collections::BTreeMap,
    net::IpAddr,
    path::{Path, PathBuf},
};

use serde_derive::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::{
    color::NormalizeMode,
    device::{DeviceOrigin, DEFAULT_API_ROOT, DISCOVERY_PORT, STREAMING_PORT},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("array {array} refers to unknown device {device}")]
    UnknownDevice { array: String, device: String },
    #[error("array {0} has no devices")]
    EmptyArray(String),
}

fn default_api_root() -> String {
    DEFAULT_API_ROOT.to_owned()
}

/// One LED device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Device {
    pub address: IpAddr,
    #[validate(range(min = 1))]
    pub width: usize,
    #[validate(range(min = 1))]
    pub height: usize,
    #[serde(default = "default_api_root")]
    pub api_root: String,
    /// Derivation of the white channel on RGBW devices
    #[serde(default)]
    pub normalize: NormalizeMode,
    /// Overrides the global streaming port
    #[serde(default)]
    pub streaming_port: Option<u16>,
}

/// Devices driven as a single surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayConfig {
    #[serde(default)]
    pub origin: DeviceOrigin,
    /// Device names, column by column
    pub columns: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Streaming {
    pub port: u16,
    #[validate(range(min = 1, max = 900))]
    pub chunk_size: usize,
    pub discovery_port: u16,
    #[validate(range(min = 1))]
    pub discovery_timeout_ms: u64,
}

impl Default for Streaming {
    fn default() -> Self {
        Self {
            port: STREAMING_PORT,
            chunk_size: crate::device::datagram::MAX_CHUNK_SIZE,
            discovery_port: DISCOVERY_PORT,
            discovery_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Http {
    #[validate(range(min = 1))]
    pub timeout_ms: u64,
}

impl Default for Http {
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub devices: BTreeMap<String, Device>,
    #[serde(default)]
    pub arrays: BTreeMap<String, ArrayConfig>,
    #[serde(default)]
    pub streaming: Streaming,
    #[serde(default)]
    pub http: Http,
}

impl Config {
    /// Location of the configuration file when none is given
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("twinkly").join("config.toml"))
    }

    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(source)?;
        config.check()?;
        Ok(config)
    }

    pub async fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let full = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&full)?;

        debug!(
            path = %path.display(),
            devices = %config.devices.len(),
            arrays = %config.arrays.len(),
            "loaded",
        );

        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        for device in self.devices.values() {
            device.validate()?;
        }

        self.streaming.validate()?;
        self.http.validate()?;

        for (name, array) in &self.arrays {
            if array.columns.iter().all(Vec::is_empty) {
                return Err(ConfigError::EmptyArray(name.clone()));
            }

            if let Some(device) = array
                .columns
                .iter()
                .flatten()
                .find(|device| !self.devices.contains_key(*device))
            {
                return Err(ConfigError::UnknownDevice {
                    array: name.clone(),
                    device: device.clone(),
                });
            }
        }

        Ok(())
    }
}
