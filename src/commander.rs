//! Outbound write commands for controllable channels.
//!
//! A commander tracks the last known state of one `(device, channel)` pair.
//! Reports from the device keep it in sync through [`Commander::update`];
//! set requests from the accessory directory go through
//! [`Commander::send`], which suppresses writes that would not change the
//! state and otherwise builds an encrypted `write` command.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::protocol::{Command, DeviceModel, write_key};
use crate::registry::Registry;
use crate::transport::Transport;
use crate::types::AccessoryKey;

/// Result of a [`Commander::send`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// A write command was handed to the transport.
    Sent,
    /// The requested value equals the last known value; nothing was sent.
    Unchanged,
}

/// Capability shared by all controllable channels.
pub trait Commander {
    /// Records a state observed from the device, without side effects.
    fn update(&mut self, value: bool);

    /// Returns the last known state, if any.
    fn last_value(&self) -> Option<bool>;

    /// Requests a state change on the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the owning gateway, its password or its address
    /// is unknown, or if the transport rejects the datagram.
    fn send(
        &mut self,
        value: bool,
        registry: &Registry,
        transport: &dyn Transport,
    ) -> Result<SendOutcome>;
}

/// Commander for an on/off channel of a wall switch or plug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchCommander {
    device_sid: String,
    model: DeviceModel,
    channel: String,
    last_value: Option<bool>,
}

impl SwitchCommander {
    /// Creates a commander with unknown state.
    #[must_use]
    pub fn new(
        device_sid: impl Into<String>,
        model: DeviceModel,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            device_sid: device_sid.into(),
            model,
            channel: channel.into(),
            last_value: None,
        }
    }

    /// Device sid.
    #[must_use]
    pub fn device_sid(&self) -> &str {
        &self.device_sid
    }

    /// Channel field name (`channel_0`, `channel_1`, `status`).
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Flips the tracked state and returns the new value.
    ///
    /// Unknown state flips to `true`.
    pub fn toggle(&mut self) -> bool {
        let value = !self.last_value.unwrap_or(false);
        self.last_value = Some(value);
        value
    }
}

impl Commander for SwitchCommander {
    fn update(&mut self, value: bool) {
        self.last_value = Some(value);
    }

    fn last_value(&self) -> Option<bool> {
        self.last_value
    }

    fn send(
        &mut self,
        value: bool,
        registry: &Registry,
        transport: &dyn Transport,
    ) -> Result<SendOutcome> {
        if self.last_value == Some(value) {
            tracing::debug!(
                "{}({}) {} already {}, not sending",
                self.model,
                self.device_sid,
                self.channel,
                on_off(value)
            );
            return Ok(SendOutcome::Unchanged);
        }

        let gateway_sid = registry
            .gateway_of(&self.device_sid)
            .ok_or_else(|| Error::UnknownGateway {
                sid: self.device_sid.clone(),
            })?;

        let Some(password) = registry.lookup_password(gateway_sid) else {
            tracing::error!(
                "no password for gateway {gateway_sid}, add it to the config to control {}",
                self.device_sid
            );
            return Err(Error::MissingPassword {
                gateway_sid: gateway_sid.to_string(),
            });
        };

        let addr = registry
            .gateway(gateway_sid)
            .and_then(|gateway| gateway.addr)
            .ok_or_else(|| Error::UnknownAddress {
                sid: gateway_sid.to_string(),
            })?;

        let key = write_key(password, registry.lookup_token(gateway_sid));
        let command = Command::Write {
            model: self.model.clone(),
            sid: self.device_sid.clone(),
            channel: self.channel.clone(),
            on: value,
            key,
        };

        tracing::debug!(
            "write {}({}) {}={} via {addr}",
            self.model,
            self.device_sid,
            self.channel,
            on_off(value)
        );
        transport.send_to(command.encode(), addr)?;
        self.last_value = Some(value);

        Ok(SendOutcome::Sent)
    }
}

/// All commanders of an engine, keyed by `(device sid, channel)`.
///
/// Each commander is also indexed by the accessory it backs so set requests
/// from the directory can be routed by accessory key.
#[derive(Debug, Default)]
pub struct CommanderTable {
    commanders: HashMap<(String, String), SwitchCommander>,
    accessories: HashMap<AccessoryKey, (String, String)>,
}

impl CommanderTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the commander for a channel, creating it with unknown state.
    pub fn entry(
        &mut self,
        accessory: &AccessoryKey,
        device_sid: &str,
        model: &DeviceModel,
        channel: &str,
    ) -> &mut SwitchCommander {
        let id = (device_sid.to_string(), channel.to_string());
        self.accessories.insert(accessory.clone(), id.clone());
        self.commanders.entry(id).or_insert_with(|| {
            tracing::debug!("new commander for {model}({device_sid}) {channel}");
            SwitchCommander::new(device_sid, model.clone(), channel)
        })
    }

    /// Returns the commander for a channel, if one exists.
    #[must_use]
    pub fn get(&self, device_sid: &str, channel: &str) -> Option<&SwitchCommander> {
        self.commanders
            .get(&(device_sid.to_string(), channel.to_string()))
    }

    /// Returns the commander backing an accessory.
    pub fn for_accessory_mut(&mut self, accessory: &AccessoryKey) -> Option<&mut SwitchCommander> {
        let id = self.accessories.get(accessory)?;
        self.commanders.get_mut(id)
    }

    /// Number of commanders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commanders.len()
    }

    /// Returns true if no commander exists yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commanders.is_empty()
    }
}

const fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}
