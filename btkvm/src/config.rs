/*!
 * Swap Configuration
 * Device table, utility path and settle delays
 */

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    Read { path: String, source: io::Error },

    #[error("Failed to parse config file {path}")]
    Parse { path: String, source: toml::de::Error },

    #[error("Failed to serialize default config")]
    Serialize { #[from] source: toml::ser::Error },

    #[error("No devices configured")]
    NoDevices,

    #[error("No bluetooth utility configured")]
    NoTool,

    #[error("Invalid hardware address for {name}: {address:?}")]
    InvalidAddress { name: String, address: String },

    #[error("Hardware address {address} is configured more than once")]
    DuplicateAddress { address: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SwapConfig {
    /// Bluetooth command line utility, looked up on PATH
    pub tool: String,
    pub settle: SettleDelays,
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceConfig {
    pub address: String,
    pub name: String,
}

/// Pauses between workflow phases so the host bluetooth stack can catch up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SettleDelays {
    pub after_unpair_ms: u64,
    pub after_pair_ms: u64,
    pub after_connect_ms: u64,
}

impl SettleDelays {
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            after_unpair_ms: 0,
            after_pair_ms: 0,
            after_connect_ms: 0,
        }
    }

    pub fn after_unpair(&self) -> Duration {
        Duration::from_millis(self.after_unpair_ms)
    }

    pub fn after_pair(&self) -> Duration {
        Duration::from_millis(self.after_pair_ms)
    }

    pub fn after_connect(&self) -> Duration {
        Duration::from_millis(self.after_connect_ms)
    }
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            after_unpair_ms: 2000,
            after_pair_ms: 1000,
            after_connect_ms: 1000,
        }
    }
}

impl DeviceConfig {
    pub fn new(address: &str, name: &str) -> Self {
        Self {
            address: address.to_string(),
            name: name.to_string(),
        }
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        // Addresses come from `blueutil --paired`, names are free text
        Self {
            tool: "blueutil".to_string(),
            settle: SettleDelays::default(),
            devices: vec![
                DeviceConfig::new("88-4d-7c-ef-e7-42", "Magic Keyboard"),
                DeviceConfig::new("c0-44-42-da-a1-17", "Magic Mouse"),
                DeviceConfig::new("d4-57-63-5c-4a-69", "Magic Trackpad"),
            ],
        }
    }
}

impl SwapConfig {
    /// Loads `path`, writing the built-in defaults there first if it does not exist yet.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();

        let config = match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content).map_err(|source| ConfigError::Parse {
                path: shown,
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                if let Err(err) = fs::write(path, toml::to_string_pretty(&config)?) {
                    warn!("Could not write default config to {}: {}", shown, err);
                } else {
                    info!("Wrote default config to {}", shown);
                }
                config
            }
            Err(source) => return Err(ConfigError::Read { path: shown, source }),
        };

        config.validated()
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Checks the device table and normalizes every address to lowercase, hyphen-delimited form.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.tool.trim().is_empty() {
            return Err(ConfigError::NoTool);
        }
        if self.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }

        let mut seen = HashSet::new();
        for device in &mut self.devices {
            let address = normalize_address(&device.address).ok_or_else(|| {
                ConfigError::InvalidAddress {
                    name: device.name.clone(),
                    address: device.address.clone(),
                }
            })?;

            if !seen.insert(address.clone()) {
                return Err(ConfigError::DuplicateAddress { address });
            }
            device.address = address;
        }

        Ok(self)
    }
}

/// `88:4D:7C:EF:E7:42` and `88-4d-7c-ef-e7-42` both become `88-4d-7c-ef-e7-42`.
fn normalize_address(address: &str) -> Option<String> {
    let address = address.trim();
    let separator = if address.contains(':') { ':' } else { '-' };

    let octets: Vec<&str> = address.split(separator).collect();
    let well_formed = octets.len() == 6
        && octets
            .iter()
            .all(|octet| octet.len() == 2 && octet.chars().all(|c| c.is_ascii_hexdigit()));

    well_formed.then(|| octets.join("-").to_ascii_lowercase())
}
