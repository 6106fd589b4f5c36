//! Outbound commands sent to gateways.
//!
//! Commands are JSON objects. The `write` command double-encodes its `data`
//! object exactly like inbound reports do.

use bytes::Bytes;
use serde_json::json;

use crate::protocol::model::DeviceModel;

/// Commands sent to a gateway or to the discovery multicast group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Gateway discovery broadcast.
    Whois,
    /// Ask a gateway for the sids of its sub-devices.
    GetIdList,
    /// Ask a gateway for the current state of one device.
    Read { sid: String },
    /// Set a channel of a device.
    Write {
        model: DeviceModel,
        sid: String,
        channel: String,
        on: bool,
        key: String,
    },
}

impl Command {
    /// Returns the `cmd` name on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Whois => "whois",
            Self::GetIdList => "get_id_list",
            Self::Read { .. } => "read",
            Self::Write { .. } => "write",
        }
    }

    /// Encodes the command into a datagram payload.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let value = match self {
            Self::Whois | Self::GetIdList => json!({ "cmd": self.name() }),
            Self::Read { sid } => json!({ "cmd": "read", "sid": sid }),
            Self::Write {
                model,
                sid,
                channel,
                on,
                key,
            } => {
                let mut data = serde_json::Map::new();
                data.insert(channel.clone(), json!(if *on { "on" } else { "off" }));
                data.insert("key".into(), json!(key));
                json!({
                    "cmd": "write",
                    "model": model.id(),
                    "sid": sid,
                    "data": serde_json::Value::Object(data).to_string(),
                })
            }
        };
        Bytes::from(value.to_string())
    }
}
