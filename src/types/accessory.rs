//! Logical accessories exposed to the accessory directory.
//!
//! One physical device may back several accessories (a temperature and
//! humidity sensor exposes two). Each accessory is identified by an
//! [`AccessoryKey`] of the form `<prefix><device sid>`.

use std::fmt;

use crate::protocol::model::prefix;

/// Identifies one logical accessory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessoryKey(String);

impl AccessoryKey {
    /// Builds a key from a model prefix and device sid.
    #[must_use]
    pub fn new(prefix: &str, device_sid: &str) -> Self {
        Self(format!("{prefix}{device_sid}"))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccessoryKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What an accessory represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessoryKind {
    /// Temperature half of a combo sensor.
    TemperatureSensor,
    /// Humidity half of a combo sensor.
    HumiditySensor,
    /// Motion/occupancy sensor.
    MotionSensor,
    /// Door/window contact sensor.
    ContactSensor,
    /// One channel of a wall switch (or a single-button wall remote).
    LightSwitch,
    /// Smart plug.
    Outlet,
    /// Dual-button wall remote with three stateless buttons.
    DuplexRemote,
    /// Wireless push button.
    WirelessButton,
}

impl AccessoryKind {
    /// Default display name when no override is configured.
    #[must_use]
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::TemperatureSensor => "Temperature Sensor",
            Self::HumiditySensor => "Humidity Sensor",
            Self::MotionSensor => "Occupancy Sensor",
            Self::ContactSensor => "Door/Window Sensor",
            Self::LightSwitch => "Light Switch",
            Self::Outlet => "Plug Switch",
            Self::DuplexRemote => "Double Light Switch Wireless",
            Self::WirelessButton => "Wireless Switch",
        }
    }

    /// Resolves the kind behind an accessory-key prefix.
    #[must_use]
    pub fn from_prefix(key_prefix: &str) -> Option<Self> {
        match key_prefix {
            prefix::TEMPERATURE => Some(Self::TemperatureSensor),
            prefix::HUMIDITY => Some(Self::HumiditySensor),
            prefix::MOTION => Some(Self::MotionSensor),
            prefix::MAGNET => Some(Self::ContactSensor),
            prefix::LIGHT_SWITCH | prefix::LIGHT_SWITCH_LEFT | prefix::LIGHT_SWITCH_RIGHT => {
                Some(Self::LightSwitch)
            }
            prefix::PLUG => Some(Self::Outlet),
            prefix::DUPLEX_REMOTE => Some(Self::DuplexRemote),
            prefix::WIRELESS_BUTTON => Some(Self::WirelessButton),
            _ => None,
        }
    }

    /// Directory category of this kind.
    ///
    /// Light switches are exposed as bulbs when `light_switch_as_bulb` is set.
    #[must_use]
    pub const fn category(self, light_switch_as_bulb: bool) -> Category {
        match self {
            Self::TemperatureSensor
            | Self::HumiditySensor
            | Self::MotionSensor
            | Self::ContactSensor => Category::Sensor,
            Self::LightSwitch if light_switch_as_bulb => Category::Lightbulb,
            Self::LightSwitch => Category::Switch,
            Self::Outlet => Category::Outlet,
            Self::DuplexRemote | Self::WirelessButton => Category::ProgrammableSwitch,
        }
    }

    /// Returns true if the accessory is named after its device sid by default.
    #[must_use]
    pub const fn named_by_sid(self) -> bool {
        matches!(self, Self::LightSwitch | Self::Outlet)
    }

    /// Returns true if the accessory accepts set requests.
    #[must_use]
    pub const fn is_controllable(self) -> bool {
        matches!(self, Self::LightSwitch | Self::Outlet)
    }
}

/// Directory category under which an accessory is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Read-only sensor.
    Sensor,
    /// On/off switch.
    Switch,
    /// On/off switch presented as a light bulb.
    Lightbulb,
    /// Power outlet.
    Outlet,
    /// Stateless programmable button(s).
    ProgrammableSwitch,
}

/// Description of an accessory handed to the directory on first sighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessory {
    /// Accessory key.
    pub key: AccessoryKey,
    /// Backing device sid (used as serial number).
    pub device_sid: String,
    /// Accessory kind.
    pub kind: AccessoryKind,
    /// Directory category.
    pub category: Category,
    /// Display name.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let key = AccessoryKey::new("LW0", "158d0001");
        assert_eq!(key.as_str(), "LW0158d0001");
        assert_eq!(key.to_string(), "LW0158d0001");
        assert_eq!(AccessoryKey::from("LW0158d0001"), key);
    }

    #[test]
    fn test_kind_from_prefix() {
        assert_eq!(
            AccessoryKind::from_prefix("LW1"),
            Some(AccessoryKind::LightSwitch)
        );
        assert_eq!(
            AccessoryKind::from_prefix("Switch"),
            Some(AccessoryKind::WirelessButton)
        );
        assert_eq!(AccessoryKind::from_prefix("Cube"), None);
    }

    #[test]
    fn test_category() {
        assert_eq!(AccessoryKind::LightSwitch.category(false), Category::Switch);
        assert_eq!(AccessoryKind::LightSwitch.category(true), Category::Lightbulb);
        assert_eq!(AccessoryKind::Outlet.category(true), Category::Outlet);
        assert_eq!(
            AccessoryKind::DuplexRemote.category(false),
            Category::ProgrammableSwitch
        );
    }

    #[test]
    fn test_controllable_kinds() {
        assert!(AccessoryKind::LightSwitch.is_controllable());
        assert!(AccessoryKind::Outlet.is_controllable());
        assert!(!AccessoryKind::WirelessButton.is_controllable());
        assert!(!AccessoryKind::TemperatureSensor.is_controllable());
    }
}
