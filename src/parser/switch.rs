//! Controllable channels: wall switches, plugs and the single-button remote.
//!
//! Channel states arrive as `"on"`, `"off"` or `"unknown"`. An unknown state
//! is dropped entirely: no reading, no commander update.

use crate::commander::Commander;
use crate::parser::{ParseContext, Parser};
use crate::protocol::Report;
use crate::protocol::model::prefix;
use crate::types::{AccessoryKey, Reading, ReadingValue};

const UNKNOWN_STATE: &str = "unknown";

/// Decodes one on/off channel and syncs its commander.
fn decode_channel(
    report: &Report,
    channel: &str,
    key_prefix: &str,
    ctx: &mut ParseContext<'_>,
) -> Option<Reading> {
    let state = report.data.str_field(channel)?;
    if state == UNKNOWN_STATE {
        tracing::warn!(
            "{}({}) {channel} state is unknown, ignoring",
            report.model,
            report.sid
        );
        return None;
    }

    let on = state == "on";
    let key = AccessoryKey::new(key_prefix, &report.sid);
    ctx.commanders
        .entry(&key, &report.sid, &report.model, channel)
        .update(on);

    Some(Reading {
        key,
        value: ReadingValue::On(on),
        battery: None,
    })
}

/// `ctrl_neutral1`: one channel, `channel_0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallSwitchParser;

impl Parser for WallSwitchParser {
    fn decode(&self, report: &Report, ctx: &mut ParseContext<'_>) -> Vec<Reading> {
        decode_channel(report, "channel_0", prefix::LIGHT_SWITCH, ctx)
            .into_iter()
            .collect()
    }
}

/// `ctrl_neutral2`: `channel_0` and `channel_1`, decoded independently.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplexWallSwitchParser;

impl Parser for DuplexWallSwitchParser {
    fn decode(&self, report: &Report, ctx: &mut ParseContext<'_>) -> Vec<Reading> {
        [
            ("channel_0", prefix::LIGHT_SWITCH_LEFT),
            ("channel_1", prefix::LIGHT_SWITCH_RIGHT),
        ]
        .into_iter()
        .filter_map(|(channel, key_prefix)| decode_channel(report, channel, key_prefix, ctx))
        .collect()
    }
}

/// `plug`: one channel, `status`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlugParser;

impl Parser for PlugParser {
    fn decode(&self, report: &Report, ctx: &mut ParseContext<'_>) -> Vec<Reading> {
        decode_channel(report, "status", prefix::PLUG, ctx)
            .into_iter()
            .collect()
    }
}

/// `86sw1`: each press on `channel_0` toggles the tracked state.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallRemoteParser;

impl Parser for WallRemoteParser {
    fn decode(&self, report: &Report, ctx: &mut ParseContext<'_>) -> Vec<Reading> {
        let channel = "channel_0";
        match report.data.str_field(channel) {
            None => Vec::new(),
            Some(UNKNOWN_STATE) => {
                tracing::warn!(
                    "{}({}) {channel} state is unknown, ignoring",
                    report.model,
                    report.sid
                );
                Vec::new()
            }
            Some(_) => {
                let key = AccessoryKey::new(prefix::LIGHT_SWITCH, &report.sid);
                let on = ctx
                    .commanders
                    .entry(&key, &report.sid, &report.model, channel)
                    .toggle();
                vec![Reading {
                    key,
                    value: ReadingValue::On(on),
                    battery: None,
                }]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commander::CommanderTable;
    use crate::parser::test_support::report;
    use crate::protocol::DeviceModel;

    #[test]
    fn test_wall_switch_updates_commander() {
        let mut commanders = CommanderTable::new();
        let mut ctx = ParseContext {
            battery: None,
            commanders: &mut commanders,
        };

        let readings = WallSwitchParser.decode(
            &report(DeviceModel::WallSwitch, "sw", r#"{"channel_0":"on"}"#),
            &mut ctx,
        );
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].key.as_str(), "LWsw");
        assert_eq!(readings[0].value, ReadingValue::On(true));
        assert_eq!(
            commanders.get("sw", "channel_0").unwrap().last_value(),
            Some(true)
        );
    }

    #[test]
    fn test_wall_switch_unknown_ignored() {
        let mut commanders = CommanderTable::new();
        let mut ctx = ParseContext {
            battery: None,
            commanders: &mut commanders,
        };

        let readings = WallSwitchParser.decode(
            &report(DeviceModel::WallSwitch, "sw", r#"{"channel_0":"unknown"}"#),
            &mut ctx,
        );
        assert!(readings.is_empty());
        assert!(commanders.is_empty());
    }

    #[test]
    fn test_duplex_unknown_channel_suppressed() {
        let mut commanders = CommanderTable::new();
        commanders
            .entry(
                &AccessoryKey::new("LW0", "d"),
                "d",
                &DeviceModel::DuplexWallSwitch,
                "channel_0",
            )
            .update(false);
        let mut ctx = ParseContext {
            battery: None,
            commanders: &mut commanders,
        };

        let readings = DuplexWallSwitchParser.decode(
            &report(
                DeviceModel::DuplexWallSwitch,
                "d",
                r#"{"channel_0":"unknown","channel_1":"on"}"#,
            ),
            &mut ctx,
        );

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].key.as_str(), "LW1d");
        assert_eq!(readings[0].value, ReadingValue::On(true));
        assert_eq!(
            commanders.get("d", "channel_0").unwrap().last_value(),
            Some(false)
        );
        assert_eq!(
            commanders.get("d", "channel_1").unwrap().last_value(),
            Some(true)
        );
    }

    #[test]
    fn test_duplex_absent_channel_skipped() {
        let mut commanders = CommanderTable::new();
        let mut ctx = ParseContext {
            battery: None,
            commanders: &mut commanders,
        };

        let readings = DuplexWallSwitchParser.decode(
            &report(DeviceModel::DuplexWallSwitch, "d", r#"{"channel_0":"off"}"#),
            &mut ctx,
        );
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].key.as_str(), "LW0d");
        assert!(commanders.get("d", "channel_1").is_none());
    }

    #[test]
    fn test_plug() {
        let mut commanders = CommanderTable::new();
        let mut ctx = ParseContext {
            battery: None,
            commanders: &mut commanders,
        };

        let off = PlugParser.decode(
            &report(DeviceModel::Plug, "p", r#"{"status":"off","load_power":"0"}"#),
            &mut ctx,
        );
        assert_eq!(off[0].key.as_str(), "PLUGp");
        assert_eq!(off[0].value, ReadingValue::On(false));

        let unknown = PlugParser.decode(
            &report(DeviceModel::Plug, "p", r#"{"status":"unknown"}"#),
            &mut ctx,
        );
        assert!(unknown.is_empty());
        assert_eq!(commanders.get("p", "status").unwrap().last_value(), Some(false));
    }

    #[test]
    fn test_wall_remote_toggles() {
        let mut commanders = CommanderTable::new();
        let mut ctx = ParseContext {
            battery: None,
            commanders: &mut commanders,
        };
        let press = report(DeviceModel::WallRemote, "r", r#"{"channel_0":"click"}"#);

        let first = WallRemoteParser.decode(&press, &mut ctx);
        let second = WallRemoteParser.decode(&press, &mut ctx);
        assert_eq!(first[0].value, ReadingValue::On(true));
        assert_eq!(second[0].value, ReadingValue::On(false));

        let unknown = WallRemoteParser.decode(
            &report(DeviceModel::WallRemote, "r", r#"{"channel_0":"unknown"}"#),
            &mut ctx,
        );
        assert!(unknown.is_empty());
        assert_eq!(commanders.get("r", "channel_0").unwrap().last_value(), Some(false));
    }
}
