//! Normalized readings emitted by the device parsers.

use crate::types::accessory::AccessoryKey;

/// Voltage at or below which a battery is reported as low (millivolts).
pub const LOW_BATTERY_MV: u32 = 2800;

/// Millivolts per battery-level percent above [`LOW_BATTERY_MV`].
const MV_PER_PERCENT: f64 = 5.0;

/// Battery status derived from a reported voltage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Battery {
    /// True when the voltage is at or below [`LOW_BATTERY_MV`].
    pub low: bool,
    /// Charge level in percent.
    ///
    /// `None` on the low-battery branch: no level is computed there and the
    /// directory keeps whatever level it showed before.
    pub level: Option<f64>,
}

impl Battery {
    /// Normalizes a voltage in millivolts.
    #[must_use]
    pub fn from_millivolts(mv: u32) -> Self {
        if mv > LOW_BATTERY_MV {
            let level = f64::from(mv - LOW_BATTERY_MV) / MV_PER_PERCENT;
            Self {
                low: false,
                level: Some(level.clamp(0.0, 100.0)),
            }
        } else {
            Self {
                low: true,
                level: None,
            }
        }
    }
}

/// Button identity on a multi-button remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// Left button (`channel_0`).
    Left,
    /// Right button (`channel_1`).
    Right,
    /// Both buttons pressed together (`dual_channel`).
    Both,
}

impl Button {
    /// Report field naming this button.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Left => "channel_0",
            Self::Right => "channel_1",
            Self::Both => "dual_channel",
        }
    }
}

/// Kind of a stateless button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PressKind {
    /// Single press.
    Single,
    /// Double press.
    Double,
    /// Long press (released).
    Long,
}

/// Decoded value of a reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadingValue {
    /// Temperature in °C.
    Temperature(f64),
    /// Relative humidity in percent.
    Humidity(f64),
    /// Motion detected.
    Motion(bool),
    /// Contact closed.
    Contact(bool),
    /// On/off state of a switch channel or plug.
    On(bool),
    /// Momentary button press.
    Press {
        button: Option<Button>,
        kind: PressKind,
    },
    /// Report carried no decodable value; only the battery is refreshed.
    BatteryOnly,
}

/// One reading for one accessory.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Target accessory.
    pub key: AccessoryKey,
    /// Decoded value.
    pub value: ReadingValue,
    /// Battery status, for battery-powered devices with a known voltage.
    pub battery: Option<Battery>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_boundary() {
        let at = Battery::from_millivolts(2800);
        assert!(at.low);
        assert_eq!(at.level, None);

        let above = Battery::from_millivolts(2801);
        assert!(!above.low);
        assert!((above.level.unwrap() - 0.2).abs() < 1e-9);

        let b = Battery::from_millivolts(2900);
        assert_eq!(b.level, Some(20.0));
    }

    #[test]
    fn test_battery_clamped() {
        assert_eq!(Battery::from_millivolts(3500).level, Some(100.0));
    }

    #[test]
    fn test_low_battery_leaves_level_unset() {
        let b = Battery::from_millivolts(2500);
        assert!(b.low);
        assert!(b.level.is_none());
    }
}
