//! Inbound message decoding.
//!
//! Gateways speak JSON over UDP. The `cmd` field classifies a message; any
//! `cmd` not listed in [`Message`] is a device report. The `data` field is
//! itself a JSON-encoded string and is decoded a second time here.
//!
//! ```text
//! {"cmd":"iam","ip":"192.168.1.2","port":"9898", ...}
//! {"cmd":"get_id_list_ack","sid":"<gw>","token":"<tok>","data":"[\"<sid>\",...]"}
//! {"cmd":"heartbeat","model":"gateway","sid":"<gw>","token":"<tok>", ...}
//! {"cmd":"write_ack", ...}
//! {"cmd":"report","model":"motion","sid":"<sid>","data":"{\"status\":\"motion\"}"}
//! ```

use std::net::IpAddr;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::protocol::model::DeviceModel;

/// A classified inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Gateway announcement in reply to `whois`.
    Iam {
        sid: Option<String>,
        ip: IpAddr,
        port: u16,
    },
    /// Device list of a gateway in reply to `get_id_list`.
    IdListAck {
        sid: String,
        token: Option<String>,
        devices: Vec<String>,
    },
    /// Periodic heartbeat from a gateway or sub-device.
    Heartbeat {
        sid: String,
        model: DeviceModel,
        token: Option<String>,
    },
    /// Acknowledgement of a previous write; not correlated to a command.
    WriteAck,
    /// Device report (`report`, `read_ack` or any other `cmd`).
    Report(Report),
}

/// A device report with its decoded `data` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Device sid.
    pub sid: String,
    /// Reporting model.
    pub model: DeviceModel,
    /// Decoded `data` object.
    pub data: ReportData,
}

/// Model-specific report fields.
///
/// Gateways encode most numbers as strings (`"temperature":"2345"`), so the
/// numeric accessors accept both JSON numbers and numeric strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportData(Map<String, Value>);

impl ReportData {
    /// Builds report data from a decoded JSON object.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns true if the field is present.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns a string field.
    #[must_use]
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Returns a numeric field, accepting numeric strings.
    #[must_use]
    pub fn number_field(&self, field: &str) -> Option<f64> {
        match self.0.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the battery voltage in millivolts, if reported.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn voltage(&self) -> Option<u32> {
        self.number_field("voltage")
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u32)
    }
}

/// Wire envelope shared by every inbound message.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    cmd: Option<String>,
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    port: Option<Value>,
    #[serde(default)]
    data: Option<String>,
}

fn require_sid(sid: Option<String>, cmd: Option<&str>) -> Result<String> {
    sid.ok_or_else(|| Error::Protocol {
        message: format!("{} without sid", cmd.unwrap_or("report")),
    })
}

/// Parses a raw datagram into a [`Message`].
///
/// # Errors
///
/// Returns an error if the datagram is not JSON, if the nested `data`
/// string is not JSON, or if a required field is missing.
pub fn parse_message(datagram: &[u8]) -> Result<Message> {
    let env: Envelope = serde_json::from_slice(datagram)?;
    let cmd = env.cmd.as_deref();

    match cmd {
        Some("iam") => {
            let ip = env
                .ip
                .as_deref()
                .and_then(|ip| ip.parse().ok())
                .ok_or_else(|| Error::Protocol {
                    message: "iam without valid ip".into(),
                })?;
            let port = env
                .port
                .as_ref()
                .and_then(parse_port)
                .ok_or_else(|| Error::Protocol {
                    message: "iam without valid port".into(),
                })?;
            Ok(Message::Iam {
                sid: env.sid,
                ip,
                port,
            })
        }
        Some("get_id_list_ack") => {
            let sid = require_sid(env.sid, cmd)?;
            let devices = match env.data.as_deref() {
                Some(data) => serde_json::from_str::<Vec<String>>(data)?,
                None => Vec::new(),
            };
            Ok(Message::IdListAck {
                sid,
                token: env.token,
                devices,
            })
        }
        Some("heartbeat") => {
            let sid = require_sid(env.sid, cmd)?;
            let model = DeviceModel::from_id(env.model.as_deref().unwrap_or_default());
            Ok(Message::Heartbeat {
                sid,
                model,
                token: env.token,
            })
        }
        Some("write_ack") => Ok(Message::WriteAck),
        _ => {
            let sid = require_sid(env.sid, cmd)?;
            let model = DeviceModel::from_id(env.model.as_deref().unwrap_or_default());
            let data = match env.data.as_deref() {
                Some(data) => ReportData::new(serde_json::from_str(data)?),
                None => ReportData::default(),
            };
            Ok(Message::Report(Report { sid, model, data }))
        }
    }
}

fn parse_port(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iam_string_port() {
        let msg = parse_message(
            br#"{"cmd":"iam","port":"9898","sid":"f0b429aa1463","model":"gateway","ip":"192.168.1.20"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            Message::Iam {
                sid: Some("f0b429aa1463".into()),
                ip: "192.168.1.20".parse().unwrap(),
                port: 9898
            }
        );
    }

    #[test]
    fn test_parse_iam_numeric_port() {
        let msg = parse_message(br#"{"cmd":"iam","ip":"10.0.0.5","port":9898}"#).unwrap();
        assert!(matches!(msg, Message::Iam { port: 9898, .. }));
    }

    #[test]
    fn test_parse_id_list_ack() {
        let msg = parse_message(
            br#"{"cmd":"get_id_list_ack","sid":"gw1","token":"1234567890abcdef","data":"[\"a\",\"b\",\"c\"]"}"#,
        )
        .unwrap();
        let Message::IdListAck { sid, token, devices } = msg else {
            panic!("expected IdListAck");
        };
        assert_eq!(sid, "gw1");
        assert_eq!(token.as_deref(), Some("1234567890abcdef"));
        assert_eq!(devices, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_report_double_encoded() {
        let msg = parse_message(
            br#"{"cmd":"report","model":"sensor_ht","sid":"158d0001","short_id":1,"data":"{\"temperature\":\"2345\",\"voltage\":3005}"}"#,
        )
        .unwrap();
        let Message::Report(report) = msg else {
            panic!("expected Report");
        };
        assert_eq!(report.model, DeviceModel::TemperatureHumidity);
        assert_eq!(report.data.number_field("temperature"), Some(2345.0));
        assert_eq!(report.data.voltage(), Some(3005));
    }

    #[test]
    fn test_unknown_cmd_is_report() {
        let msg =
            parse_message(br#"{"cmd":"read_ack","model":"plug","sid":"p1","data":"{\"status\":\"on\"}"}"#)
                .unwrap();
        assert!(matches!(msg, Message::Report(ref r) if r.model == DeviceModel::Plug));
    }

    #[test]
    fn test_write_ack() {
        let msg = parse_message(br#"{"cmd":"write_ack","sid":"x","data":"{}"}"#).unwrap();
        assert_eq!(msg, Message::WriteAck);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse_message(b"{not json"), Err(Error::Json(_))));
        assert!(matches!(
            parse_message(br#"{"cmd":"report","model":"motion","sid":"m","data":"{broken"}"#),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_report_without_sid() {
        assert!(matches!(
            parse_message(br#"{"cmd":"report","model":"motion"}"#),
            Err(Error::Protocol { .. })
        ));
    }
}
