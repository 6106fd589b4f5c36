//! TOML configuration.
//!
//! ```toml
//! sid = ["f0b429aa1463"]
//! password = ["0123456789abcdef"]
//! light_switch_as_bulb = false
//!
//! [sensor_names]
//! "fb25" = "Hallway"
//!
//! [network]
//! bind_port = 9898
//! ```
//!
//! Every field is optional; a missing file section falls back to protocol
//! defaults.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::discovery::{DEFAULT_DISCOVERY_INTERVAL, Discovery};
use crate::error::{Error, Result};
use crate::registry::EvictionPolicy;
use crate::sweeper::{DEFAULT_SWEEP_INTERVAL, Sweeper};
use crate::transport::UdpConfig;
use crate::transport::udp::{DEFAULT_BIND_PORT, DEFAULT_MULTICAST_ADDR, DEFAULT_MULTICAST_PORT};
use crate::types::{AccessoryKind, PASSWORD_LEN, short_sid};

/// Top-level configuration file schema.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Gateway sids, parallel to `password`.
    #[serde(default)]
    pub sid: Vec<String>,

    /// Gateway passwords (16-byte AES keys), parallel to `sid`.
    #[serde(default)]
    pub password: Vec<String>,

    /// Expose wall switches as light bulbs instead of switches.
    #[serde(default)]
    pub light_switch_as_bulb: bool,

    /// Display-name overrides keyed by the last four sid characters or the
    /// full sid.
    #[serde(default)]
    pub sensor_names: HashMap<String, String>,

    /// Socket and timer settings.
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Socket and timer settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    pub bind_port: Option<u16>,
    pub multicast_addr: Option<Ipv4Addr>,
    pub multicast_port: Option<u16>,
    pub discovery_interval_secs: Option<u64>,
    pub sweep_interval_secs: Option<u64>,
    pub device_timeout_secs: Option<u64>,
    pub absolute_timeout_secs: Option<u64>,
}

impl Config {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or fails validation.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        tracing::debug!("loaded config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Checks the gateway credential lists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `sid` and `password` differ in length and
    /// [`Error::InvalidPassword`] if a password is not 16 bytes.
    pub fn validate(&self) -> Result<()> {
        self.gateway_passwords().map(|_| ())
    }

    /// Returns `(gateway sid, password)` pairs in configured order.
    ///
    /// # Errors
    ///
    /// Same as [`Config::validate`].
    pub fn gateway_passwords(&self) -> Result<Vec<(String, [u8; PASSWORD_LEN])>> {
        if self.sid.len() != self.password.len() {
            return Err(Error::Config {
                reason: format!(
                    "{} gateway sids but {} passwords",
                    self.sid.len(),
                    self.password.len()
                ),
            });
        }

        self.sid
            .iter()
            .zip(&self.password)
            .map(|(sid, password)| {
                let key: [u8; PASSWORD_LEN] =
                    password
                        .as_bytes()
                        .try_into()
                        .map_err(|_| Error::InvalidPassword {
                            gateway_sid: sid.clone(),
                            len: password.len(),
                        })?;
                Ok((sid.clone(), key))
            })
            .collect()
    }

    /// Display name for an accessory backed by `device_sid`.
    ///
    /// A `sensor_names` entry for the last four sid characters wins over one
    /// for the full sid. Without an override, switches and plugs are named
    /// by their short sid and everything else by its kind.
    #[must_use]
    pub fn display_name(&self, device_sid: &str, kind: AccessoryKind) -> String {
        let short = short_sid(device_sid);
        if let Some(name) = self
            .sensor_names
            .get(short)
            .or_else(|| self.sensor_names.get(device_sid))
        {
            return name.clone();
        }

        if kind.named_by_sid() {
            short.to_string()
        } else {
            kind.default_name().to_string()
        }
    }

    /// UDP socket settings.
    #[must_use]
    pub fn udp(&self) -> UdpConfig {
        let network = &self.network;
        UdpConfig::new()
            .bind_port(network.bind_port.unwrap_or(DEFAULT_BIND_PORT))
            .multicast_addr(network.multicast_addr.unwrap_or(DEFAULT_MULTICAST_ADDR))
            .multicast_port(network.multicast_port.unwrap_or(DEFAULT_MULTICAST_PORT))
    }

    /// Discovery settings.
    #[must_use]
    pub fn discovery(&self) -> Discovery {
        Discovery::new().interval(
            self.network
                .discovery_interval_secs
                .map_or(DEFAULT_DISCOVERY_INTERVAL, Duration::from_secs),
        )
    }

    /// Sweeper settings.
    #[must_use]
    pub fn sweeper(&self) -> Sweeper {
        let defaults = EvictionPolicy::default();
        let policy = EvictionPolicy {
            device_timeout: self
                .network
                .device_timeout_secs
                .map_or(defaults.device_timeout, Duration::from_secs),
            absolute_timeout: self
                .network
                .absolute_timeout_secs
                .map_or(defaults.absolute_timeout, Duration::from_secs),
        };
        Sweeper::new(policy).interval(
            self.network
                .sweep_interval_secs
                .map_or(DEFAULT_SWEEP_INTERVAL, Duration::from_secs),
        )
    }
}
