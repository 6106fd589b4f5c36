//! Stateless buttons: the dual-button wall remote and the wireless switch.

use crate::parser::{ParseContext, Parser};
use crate::protocol::Report;
use crate::protocol::model::prefix;
use crate::types::{AccessoryKey, Button, PressKind, Reading, ReadingValue};

/// `86sw2`: the first of `channel_0`, `channel_1`, `dual_channel` present
/// in the report is a single press of that button.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplexRemoteParser;

impl Parser for DuplexRemoteParser {
    fn decode(&self, report: &Report, ctx: &mut ParseContext<'_>) -> Vec<Reading> {
        let button = [Button::Left, Button::Right, Button::Both]
            .into_iter()
            .find(|button| report.data.contains(button.field()));

        // read_ack carries no button; refresh the battery only
        let value = button.map_or(ReadingValue::BatteryOnly, |button| ReadingValue::Press {
            button: Some(button),
            kind: PressKind::Single,
        });

        vec![Reading {
            key: AccessoryKey::new(prefix::DUPLEX_REMOTE, &report.sid),
            value,
            battery: ctx.battery,
        }]
    }
}

/// `switch`: `status` names the press kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct WirelessButtonParser;

impl Parser for WirelessButtonParser {
    fn decode(&self, report: &Report, ctx: &mut ParseContext<'_>) -> Vec<Reading> {
        let kind = match report.data.str_field("status") {
            Some("click") => Some(PressKind::Single),
            Some("double_click") => Some(PressKind::Double),
            Some("long_click_release") => Some(PressKind::Long),
            _ => None,
        };

        let value = kind.map_or(ReadingValue::BatteryOnly, |kind| ReadingValue::Press {
            button: None,
            kind,
        });

        vec![Reading {
            key: AccessoryKey::new(prefix::WIRELESS_BUTTON, &report.sid),
            value,
            battery: ctx.battery,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commander::CommanderTable;
    use crate::parser::test_support::report;
    use crate::protocol::DeviceModel;
    use crate::types::Battery;

    #[test]
    fn test_duplex_remote_buttons() {
        let mut commanders = CommanderTable::new();
        let mut ctx = ParseContext {
            battery: Some(Battery::from_millivolts(2700)),
            commanders: &mut commanders,
        };

        for (data, button) in [
            (r#"{"channel_0":"click"}"#, Button::Left),
            (r#"{"channel_1":"click"}"#, Button::Right),
            (r#"{"dual_channel":"both_click"}"#, Button::Both),
        ] {
            let readings =
                DuplexRemoteParser.decode(&report(DeviceModel::DuplexWallRemote, "r", data), &mut ctx);
            assert_eq!(readings[0].key.as_str(), "86sw2r");
            assert_eq!(
                readings[0].value,
                ReadingValue::Press {
                    button: Some(button),
                    kind: PressKind::Single
                }
            );
            assert!(readings[0].battery.unwrap().low);
        }
        assert!(commanders.is_empty());
    }

    #[test]
    fn test_duplex_remote_without_button() {
        let mut commanders = CommanderTable::new();
        let mut ctx = ParseContext {
            battery: None,
            commanders: &mut commanders,
        };
        let readings = DuplexRemoteParser.decode(
            &report(DeviceModel::DuplexWallRemote, "r", r#"{"voltage":3000}"#),
            &mut ctx,
        );
        assert_eq!(readings[0].value, ReadingValue::BatteryOnly);
    }

    #[test]
    fn test_wireless_button_kinds() {
        let mut commanders = CommanderTable::new();
        let mut ctx = ParseContext {
            battery: None,
            commanders: &mut commanders,
        };

        for (status, kind) in [
            ("click", PressKind::Single),
            ("double_click", PressKind::Double),
            ("long_click_release", PressKind::Long),
        ] {
            let data = format!(r#"{{"status":"{status}"}}"#);
            let readings =
                WirelessButtonParser.decode(&report(DeviceModel::WirelessButton, "b", &data), &mut ctx);
            assert_eq!(readings[0].key.as_str(), "Switchb");
            assert_eq!(readings[0].value, ReadingValue::Press { button: None, kind });
        }

        let press = WirelessButtonParser.decode(
            &report(DeviceModel::WirelessButton, "b", r#"{"status":"long_click_press"}"#),
            &mut ctx,
        );
        assert_eq!(press[0].value, ReadingValue::BatteryOnly);
    }
}
