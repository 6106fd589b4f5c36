//! Device model identifiers reported by the gateway.
//!
//! Every report carries a `model` string. It is resolved once into a closed
//! [`DeviceModel`] so the rest of the engine matches on variants instead of
//! strings. Models this library does not know are kept as
//! [`DeviceModel::Unrecognized`] so they can still be logged and tracked.

use std::fmt;

/// Accessory-key prefixes, one per logical accessory kind.
pub mod prefix {
    /// Temperature half of a combo sensor.
    pub const TEMPERATURE: &str = "Tem";
    /// Humidity half of a combo sensor.
    pub const HUMIDITY: &str = "Hum";
    /// Motion sensor.
    pub const MOTION: &str = "Mot";
    /// Contact sensor.
    pub const MAGNET: &str = "Mag";
    /// Single-channel switch or single-button wall remote.
    pub const LIGHT_SWITCH: &str = "LW";
    /// Left channel of a dual-channel switch.
    pub const LIGHT_SWITCH_LEFT: &str = "LW0";
    /// Right channel of a dual-channel switch.
    pub const LIGHT_SWITCH_RIGHT: &str = "LW1";
    /// Dual-button wall remote.
    pub const DUPLEX_REMOTE: &str = "86sw2";
    /// Smart plug.
    pub const PLUG: &str = "PLUG";
    /// Wireless push button.
    pub const WIRELESS_BUTTON: &str = "Switch";
}

/// A device model as reported in the `model` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceModel {
    /// The gateway itself (`gateway`).
    Gateway,
    /// Temperature and humidity combo sensor (`sensor_ht`).
    TemperatureHumidity,
    /// Motion sensor (`motion`).
    Motion,
    /// Door/window contact sensor (`magnet`).
    Magnet,
    /// Single-channel wired wall switch (`ctrl_neutral1`).
    WallSwitch,
    /// Dual-channel wired wall switch (`ctrl_neutral2`).
    DuplexWallSwitch,
    /// Single-button wireless wall remote (`86sw1`).
    WallRemote,
    /// Dual-button wireless wall remote (`86sw2`).
    DuplexWallRemote,
    /// Smart plug (`plug`).
    Plug,
    /// Wireless push button (`switch`).
    WirelessButton,
    /// Any model id not listed above.
    Unrecognized(String),
}

impl DeviceModel {
    /// Resolves a wire model id.
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        match id {
            "gateway" => Self::Gateway,
            "sensor_ht" => Self::TemperatureHumidity,
            "motion" => Self::Motion,
            "magnet" => Self::Magnet,
            "ctrl_neutral1" => Self::WallSwitch,
            "ctrl_neutral2" => Self::DuplexWallSwitch,
            "86sw1" => Self::WallRemote,
            "86sw2" => Self::DuplexWallRemote,
            "plug" => Self::Plug,
            "switch" => Self::WirelessButton,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Returns the wire model id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Gateway => "gateway",
            Self::TemperatureHumidity => "sensor_ht",
            Self::Motion => "motion",
            Self::Magnet => "magnet",
            Self::WallSwitch => "ctrl_neutral1",
            Self::DuplexWallSwitch => "ctrl_neutral2",
            Self::WallRemote => "86sw1",
            Self::DuplexWallRemote => "86sw2",
            Self::Plug => "plug",
            Self::WirelessButton => "switch",
            Self::Unrecognized(id) => id,
        }
    }

    /// Returns true if this model identifies a gateway rather than a sub-device.
    #[must_use]
    pub const fn is_gateway(&self) -> bool {
        matches!(self, Self::Gateway)
    }

    /// Accessory-key prefixes owned by a device of this model.
    ///
    /// A device reporting under this model refreshes the last-seen time of
    /// one accessory per prefix (`<prefix><sid>`).
    #[must_use]
    pub const fn accessory_prefixes(&self) -> &'static [&'static str] {
        match self {
            Self::TemperatureHumidity => &[prefix::TEMPERATURE, prefix::HUMIDITY],
            Self::Motion => &[prefix::MOTION],
            Self::Magnet => &[prefix::MAGNET],
            Self::WallSwitch | Self::WallRemote => &[prefix::LIGHT_SWITCH],
            Self::DuplexWallSwitch => &[prefix::LIGHT_SWITCH_LEFT, prefix::LIGHT_SWITCH_RIGHT],
            Self::DuplexWallRemote => &[prefix::DUPLEX_REMOTE],
            Self::Plug => &[prefix::PLUG],
            Self::WirelessButton => &[prefix::WIRELESS_BUTTON],
            Self::Gateway | Self::Unrecognized(_) => &[],
        }
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
