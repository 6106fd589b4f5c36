//! Per-model report decoding.
//!
//! Each device model has one [`Parser`] turning a report's `data` object
//! into normalized [`Reading`]s. Switch-like parsers also keep the
//! [`CommanderTable`] in sync with the state the device reports.
//!
//! Models are resolved to parsers through the closed [`ParserKind`]
//! registry; models without a parser resolve to
//! [`ParserKind::Unrecognized`].

mod button;
mod sensor;
mod switch;

use crate::commander::CommanderTable;
use crate::protocol::{DeviceModel, Report};
use crate::types::{Battery, Reading};

pub use button::{DuplexRemoteParser, WirelessButtonParser};
pub use sensor::{MagnetParser, MotionParser, TemperatureHumidityParser};
pub use switch::{DuplexWallSwitchParser, PlugParser, WallRemoteParser, WallSwitchParser};

/// State a parser may read or update while decoding one report.
pub struct ParseContext<'a> {
    /// Battery status from the latest cached voltage of the reporting device.
    pub battery: Option<Battery>,
    /// Commanders of all controllable channels.
    pub commanders: &'a mut CommanderTable,
}

/// Decoding capability shared by all models.
pub trait Parser: Send + Sync {
    /// Decodes a report into zero or more readings.
    fn decode(&self, report: &Report, ctx: &mut ParseContext<'_>) -> Vec<Reading>;
}

/// Closed registry of parsers, one variant per supported model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    TemperatureHumidity,
    Motion,
    Magnet,
    WallSwitch,
    DuplexWallSwitch,
    WallRemote,
    DuplexWallRemote,
    Plug,
    WirelessButton,
    /// Model without a parser; reports are tracked but not decoded.
    Unrecognized,
}

impl ParserKind {
    /// Resolves the parser for a model.
    #[must_use]
    pub const fn for_model(model: &DeviceModel) -> Self {
        match model {
            DeviceModel::TemperatureHumidity => Self::TemperatureHumidity,
            DeviceModel::Motion => Self::Motion,
            DeviceModel::Magnet => Self::Magnet,
            DeviceModel::WallSwitch => Self::WallSwitch,
            DeviceModel::DuplexWallSwitch => Self::DuplexWallSwitch,
            DeviceModel::WallRemote => Self::WallRemote,
            DeviceModel::DuplexWallRemote => Self::DuplexWallRemote,
            DeviceModel::Plug => Self::Plug,
            DeviceModel::WirelessButton => Self::WirelessButton,
            DeviceModel::Gateway | DeviceModel::Unrecognized(_) => Self::Unrecognized,
        }
    }

    /// Returns the parser implementation, or `None` for unrecognized models.
    #[must_use]
    pub fn parser(self) -> Option<&'static dyn Parser> {
        let parser: &'static dyn Parser = match self {
            Self::TemperatureHumidity => &TemperatureHumidityParser,
            Self::Motion => &MotionParser,
            Self::Magnet => &MagnetParser,
            Self::WallSwitch => &WallSwitchParser,
            Self::DuplexWallSwitch => &DuplexWallSwitchParser,
            Self::WallRemote => &WallRemoteParser,
            Self::DuplexWallRemote => &DuplexRemoteParser,
            Self::Plug => &PlugParser,
            Self::WirelessButton => &WirelessButtonParser,
            Self::Unrecognized => return None,
        };
        Some(parser)
    }
}
